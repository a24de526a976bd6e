//! Deterministic component/window selection for one decision (`spec.md`
//! §4.5). The RNG is reseeded once per run from `run_number` so a run's
//! sequence of decisions is exactly replayable (P9).
//!
//! Only the stable, version-independent `RngCore`/`SeedableRng` trait
//! methods are used here (`next_u64`, `seed_from_u64`) rather than `rand`'s
//! higher-level convenience methods, whose names have changed across `rand`
//! releases.
use rand::{
    rngs::StdRng,
    RngCore,
    SeedableRng,
};
use trigemu_messages::{
    ComponentRequest,
    DaqTick,
    GeoId,
    TickDelta,
};

/// Per-run deterministic sampler. One instance is created at `start` and
/// reused for every decision emitted during the run.
pub struct ComponentSampler {
    rng: StdRng,
}

impl ComponentSampler {
    pub fn for_run(run_number: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(run_number),
        }
    }

    /// Draw a uniform integer in `[low, high]` inclusive, using only
    /// `next_u64`.
    fn uniform_inclusive(&mut self, low: u64, high: u64) -> u64 {
        debug_assert!(low <= high);
        let span = high - low + 1;
        low + (self.rng.next_u64() % span)
    }

    /// A uniform sample without replacement of size `n` from `links`, via a
    /// partial Fisher-Yates shuffle: deterministic given the RNG state, and
    /// the one sampling-without-replacement algorithm this module commits to
    /// (`spec.md` §4.5, §9 "any implementation choice... is acceptable
    /// provided it is documented and stable").
    fn sample_without_replacement(&mut self, links: &[GeoId], n: usize) -> Vec<GeoId> {
        let mut pool = links.to_vec();
        let len = pool.len();
        let n = n.min(len);
        for i in 0..n {
            let j = i + (self.rng.next_u64() as usize % (len - i));
            pool.swap(i, j);
        }
        pool.truncate(n);
        pool
    }

    /// Build the component requests for a decision at timestamp `t`.
    pub fn sample_components(
        &mut self,
        links: &[GeoId],
        min_links: u32,
        max_links: u32,
        min_window_ticks: u64,
        max_window_ticks: u64,
        trigger_window_offset: i64,
        t: DaqTick,
    ) -> Vec<ComponentRequest> {
        let max_links = (max_links as usize).min(links.len());
        let min_links = (min_links as usize).min(max_links);
        let n = if min_links == max_links {
            min_links
        } else {
            self.uniform_inclusive(min_links as u64, max_links as u64) as usize
        };

        let window_begin = shift_by_offset(t, trigger_window_offset);

        self.sample_without_replacement(links, n)
            .into_iter()
            .map(|component| {
                let width = self.uniform_inclusive(min_window_ticks, max_window_ticks);
                ComponentRequest {
                    component,
                    window_begin,
                    window_end: window_begin + width,
                }
            })
            .collect()
    }
}

/// `window_begin = trigger_timestamp - trigger_window_offset` (`spec.md`
/// §3). `trigger_window_offset` is signed so a negative offset can push the
/// window to start after the trigger timestamp.
fn shift_by_offset(t: DaqTick, offset: i64) -> DaqTick {
    let delta = TickDelta(-offset);
    if delta.0 >= 0 {
        t + delta.0 as u64
    } else {
        t - (-delta.0) as u64
    }
}
