//! The Decision Scheduler (`spec.md` §4.4): the periodic emitter. Gated by
//! the timestamp estimate, inhibit/pause state, and credit, it produces
//! `TriggerDecision`s aligned to a regular DAQ-tick grid, and performs the
//! end-of-run burst on stop.
use std::{
    sync::Arc,
    time::Duration,
};

use runtime::Runtime;
use trigemu_messages::{
    channel::EndpointSender,
    ComponentRequest,
    DaqTick,
    GeoId,
    RunNumber,
    TriggerDecision,
    TriggerType,
};

use crate::{
    sampling::ComponentSampler,
    state::SharedState,
};

const POLL_SLEEP: Duration = Duration::from_millis(10);
const SEND_TIMEOUT: Duration = Duration::from_millis(10);

/// Static, per-run configuration the scheduler reads without synchronization
/// (`spec.md` §5 "Configuration values that are never changed after
/// configure are read without synchronization"). `trigger_interval_ticks` is
/// the one cadence value that *can* change mid-run (via `resume`) and so
/// lives in [`SharedState`] instead of here.
pub struct SchedulerConfig {
    pub run_number: RunNumber,
    pub trigger_offset: i64,
    pub trigger_delay_ticks: u64,
    pub trigger_window_offset: i64,
    pub min_readout_window_ticks: u64,
    pub max_readout_window_ticks: u64,
    pub min_links_in_request: u32,
    pub max_links_in_request: u32,
    pub links: Vec<GeoId>,
    pub trigger_type: TriggerType,
    pub repeat_count: u32,
    pub stop_burst_count: u32,
    pub has_token_endpoint: bool,
}

pub fn run<R, Tx>(state: &Arc<SharedState>, rt: &R, config: &SchedulerConfig, sink: &Tx)
where
    R: Runtime,
    Tx: EndpointSender<TriggerDecision>,
{
    let mut sampler = ComponentSampler::for_run(config.run_number.0);

    // Wait until the estimator has anchored, or the module is stopped first.
    while state.is_running() && !state.load_estimate().is_valid() {
        rt.sleep(POLL_SLEEP);
    }
    if !state.is_running() {
        maybe_stop_burst(state, rt, config, &mut sampler, sink, initial_grid_point(state, config));
        return;
    }

    let mut next = initial_grid_point(state, config);

    while state.is_running() {
        // a. Sleep-poll until the estimate reaches next + delay, or we're
        // asked to stop.
        while state.is_running() && !ready_to_emit(state, config, next) {
            rt.sleep(POLL_SLEEP);
        }
        if !state.is_running() {
            break;
        }

        let credit = read_credit(state, config);
        let gated = state.is_inhibited() || state.is_paused() || credit == 0;

        if !gated {
            emit_burst(state, config, &mut sampler, sink, next, config.repeat_count);
        } else if credit == 0 {
            state.record_inhibited_grid_point();
            crate::metrics::log_inhibited_grid_point();
        } else {
            tracing::debug!(next = next.0, "grid point skipped (paused or inhibited)");
        }

        next = next + state.trigger_interval_ticks() as u64;
    }

    maybe_stop_burst(state, rt, config, &mut sampler, sink, next);
}

fn initial_grid_point(state: &SharedState, config: &SchedulerConfig) -> DaqTick {
    let estimate = state.load_estimate().0 as i64;
    let interval = state.trigger_interval_ticks();
    let floor = (estimate / interval) * interval;
    DaqTick((floor + interval + config.trigger_offset) as u64)
}

fn ready_to_emit(state: &SharedState, config: &SchedulerConfig, next: DaqTick) -> bool {
    let estimate = state.load_estimate();
    estimate.is_valid() && estimate.0 >= next.0 + config.trigger_delay_ticks
}

fn read_credit(state: &SharedState, config: &SchedulerConfig) -> i64 {
    if config.has_token_endpoint {
        state.credit()
    } else {
        1
    }
}

/// Emit `count` decisions at `timestamp`, all sharing the same component
/// selection but consecutive trigger numbers (`spec.md` §4.4 step c).
fn emit_burst<Tx>(
    state: &SharedState,
    config: &SchedulerConfig,
    sampler: &mut ComponentSampler,
    sink: &Tx,
    timestamp: DaqTick,
    count: u32,
) where
    Tx: EndpointSender<TriggerDecision>,
{
    if count == 0 {
        return;
    }

    let components = sample_components(config, sampler, timestamp);
    let first = state.reserve_trigger_numbers(count as u64);

    for i in 0..count {
        if config.has_token_endpoint && !state.try_take_credit() {
            // Credit ran out partway through this burst: stop here rather
            // than drive credit negative (`spec.md` §3/§5 "credit is
            // non-negative", P6 "credit conservation"). The remaining
            // reserved trigger numbers are simply never used.
            tracing::debug!(
                timestamp = timestamp.0,
                remaining = count - i,
                "credit exhausted mid-burst; truncating"
            );
            break;
        }
        if config.has_token_endpoint {
            crate::metrics::log_credit(state.credit());
        }

        let trigger_number = trigemu_messages::TriggerNumber(first.0 + i as u64);
        let decision = TriggerDecision {
            trigger_number,
            run_number: config.run_number,
            trigger_timestamp: timestamp,
            trigger_type: config.trigger_type,
            components: components.clone(),
        };

        state.insert_open_decision(trigger_number);
        state.record_trigger_emitted();
        crate::metrics::log_trigger_emitted();
        crate::metrics::log_open_decisions(state.open_decisions_snapshot().len());

        if sink.send_timeout(decision, SEND_TIMEOUT).is_err() {
            state.record_dropped_decision();
            crate::metrics::log_dropped_decision();
            tracing::warn!(
                trigger_number = trigger_number.0,
                "send timeout on decision sink; decision dropped, accounting still advances"
            );
        }
    }
}

fn sample_components(
    config: &SchedulerConfig,
    sampler: &mut ComponentSampler,
    timestamp: DaqTick,
) -> Vec<ComponentRequest> {
    sampler.sample_components(
        &config.links,
        config.min_links_in_request,
        config.max_links_in_request,
        config.min_readout_window_ticks,
        config.max_readout_window_ticks,
        config.trigger_window_offset,
        timestamp,
    )
}

/// On stop, if a burst is configured, emit it ungated at the current grid
/// point (`spec.md` §4.4 step 5, §9 open question: the source does not gate
/// this, and this implementation preserves that).
fn maybe_stop_burst<R, Tx>(
    state: &SharedState,
    _rt: &R,
    config: &SchedulerConfig,
    sampler: &mut ComponentSampler,
    sink: &Tx,
    next: DaqTick,
) where
    R: Runtime,
    Tx: EndpointSender<TriggerDecision>,
{
    if config.stop_burst_count == 0 {
        return;
    }
    emit_burst(state, config, sampler, sink, next, config.stop_burst_count);
}
