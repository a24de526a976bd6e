//! The Timestamp Estimator (`spec.md` §4.1): converts an arriving stream of
//! `TimeSync` observations into a continuously readable, monotone DAQ-tick
//! estimate. Grounded in `examples/original_source/src/TimestampEstimator.cpp`
//! for the anchor-selection/extrapolation algorithm.
use std::{
    sync::Arc,
    time::Duration,
};

use runtime::Runtime;
use trigemu_messages::{
    channel::EndpointReceiver,
    ClockHz,
    DaqTick,
    TimeSync,
};

use crate::state::SharedState;

const RECV_TIMEOUT: Duration = Duration::from_millis(1);

/// Runs until `state.is_running()` goes false. Intended to be the body of a
/// dedicated worker thread spawned by the lifecycle controller at `start`.
pub fn run<R, Rx>(state: &Arc<SharedState>, rt: &R, clock_hz: ClockHz, time_sync_rx: &Rx)
where
    R: Runtime,
    Rx: EndpointReceiver<TimeSync>,
{
    // Pre-drain: discard residue from a previous run (spec.md §4.1 step 1).
    time_sync_rx.drain();

    let mut anchor: Option<TimeSync> = None;

    while state.is_running() {
        match time_sync_rx.recv_timeout(RECV_TIMEOUT) {
            Ok(sync) => {
                if anchor.map(|a| sync.daq_time > a.daq_time).unwrap_or(true) {
                    anchor = Some(sync);
                }
            }
            Err(_) => {
                // Timeout (or disconnect): nothing new arrived this tick, but
                // we still re-extrapolate below so the estimate keeps moving
                // between sync messages.
            }
        }

        if let Some(anchor) = anchor {
            extrapolate_and_publish(state, rt, clock_hz, anchor);
        }
    }

    // Shutdown: drain and discard remaining messages before exiting
    // (spec.md §4.1 step 4).
    time_sync_rx.drain();
}

fn extrapolate_and_publish<R: Runtime>(state: &SharedState, rt: &R, clock_hz: ClockHz, anchor: TimeSync) {
    let now_us = rt.system_time_micros();
    let Some(elapsed_us) = now_us.checked_sub(anchor.system_time.0) else {
        // The anchor's system_time is in the future relative to our wall
        // clock: a clock-skew anomaly (spec.md §7 taxonomy item 3). Do not
        // update the estimate for this check.
        tracing::warn!(
            anchor_system_time = anchor.system_time.0,
            now_us,
            "time-sync anchor is from the future; estimate not updated"
        );
        return;
    };
    let delta_ticks = elapsed_us * clock_hz.get() / 1_000_000;
    state.store_estimate(anchor.daq_time + delta_ticks);
}

#[cfg(test)]
mod tests {
    use runtime::testing::TestRuntime;
    use trigemu_messages::{
        channel::bounded,
        RunNumber,
        SystemMicros,
    };

    use super::*;

    #[test]
    fn returns_invalid_until_first_anchor() {
        let state = Arc::new(SharedState::new(RunNumber(1), 100, 0));
        assert_eq!(state.load_estimate(), DaqTick::INVALID);
    }

    #[test]
    fn extrapolates_forward_from_anchor() {
        let state = Arc::new(SharedState::new(RunNumber(1), 100, 0));
        let rt = TestRuntime::new();
        let clock_hz = ClockHz::new(1_000_000).unwrap();
        let anchor = TimeSync {
            daq_time: DaqTick(1_000_000),
            system_time: SystemMicros(rt.system_time_micros()),
        };
        extrapolate_and_publish(&state, &rt, clock_hz, anchor);
        assert_eq!(state.load_estimate(), DaqTick(1_000_000));

        rt.advance(Duration::from_millis(10));
        extrapolate_and_publish(&state, &rt, clock_hz, anchor);
        assert_eq!(state.load_estimate(), DaqTick(1_010_000));
    }

    #[test]
    fn future_anchor_is_not_applied() {
        let state = Arc::new(SharedState::new(RunNumber(1), 100, 0));
        let rt = TestRuntime::new();
        let clock_hz = ClockHz::new(1_000_000).unwrap();
        let anchor = TimeSync {
            daq_time: DaqTick(1_000_000),
            system_time: SystemMicros(rt.system_time_micros() + 1_000_000),
        };
        extrapolate_and_publish(&state, &rt, clock_hz, anchor);
        assert_eq!(state.load_estimate(), DaqTick::INVALID);
    }

    #[test]
    fn drains_residual_messages_before_and_after_running() {
        let state = Arc::new(SharedState::new(RunNumber(1), 100, 0));
        state.stop();
        let rt = TestRuntime::new();
        let clock_hz = ClockHz::new(1_000_000).unwrap();
        let (tx, rx) = bounded::<TimeSync>(8);
        tx.send_timeout(
            TimeSync {
                daq_time: DaqTick(1),
                system_time: SystemMicros(0),
            },
            Duration::from_millis(10),
        )
        .unwrap();

        run(&state, &rt, clock_hz, &rx);

        assert_eq!(state.load_estimate(), DaqTick::INVALID);
    }
}
