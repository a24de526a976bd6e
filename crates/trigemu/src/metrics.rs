//! Metrics emitted by the module's workers, per `SPEC_FULL.md` §4.8. These
//! mirror (but do not replace) the atomic counters in [`crate::state`]: the
//! atomics are the source of truth read by the info surface, these are the
//! Prometheus-visible counterparts a scrape sees.
use metrics::{
    register_trigemu_counter,
    register_trigemu_gauge,
};

register_trigemu_counter!(pub TRIGGERS_EMITTED_TOTAL, "Count of trigger decisions successfully handed to the sink");
register_trigemu_counter!(pub INHIBITED_GRID_POINTS_TOTAL, "Count of grid points skipped because credit was exhausted");
register_trigemu_counter!(pub DROPPED_DECISIONS_TOTAL, "Count of decisions dropped due to a send timeout on the sink");
register_trigemu_gauge!(pub OPEN_DECISIONS, "Current size of the open-decisions set");
register_trigemu_gauge!(pub CREDIT_TOKENS, "Current value of the credit counter");

pub fn log_trigger_emitted() {
    TRIGGERS_EMITTED_TOTAL.inc();
}

pub fn log_inhibited_grid_point() {
    INHIBITED_GRID_POINTS_TOTAL.inc();
}

pub fn log_dropped_decision() {
    DROPPED_DECISIONS_TOTAL.inc();
}

pub fn log_open_decisions(count: usize) {
    OPEN_DECISIONS.set(count as f64);
}

pub fn log_credit(credit: i64) {
    CREDIT_TOKENS.set(credit as f64);
}
