//! The Token Consumer (`spec.md` §4.3): maintains the credit counter and
//! retires entries from the open-decisions set. Present only when a token
//! endpoint is wired; otherwise the scheduler treats credit as infinite.
use std::time::Duration;

use runtime::Runtime;
use trigemu_messages::{
    channel::EndpointReceiver,
    TriggerDecisionToken,
    TriggerNumber,
};

use crate::state::SharedState;

const RECV_TIMEOUT: Duration = Duration::from_millis(1);
const IDLE_SLEEP: Duration = Duration::from_millis(10);
const DIAGNOSTIC_INTERVAL: Duration = Duration::from_secs(3);

pub fn run<R, Rx>(state: &SharedState, rt: &R, token_rx: &Rx)
where
    R: Runtime,
    Rx: EndpointReceiver<TriggerDecisionToken>,
{
    token_rx.drain();

    let mut last_diagnostic = rt.monotonic_now();

    while state.is_running() {
        match token_rx.recv_timeout(RECV_TIMEOUT) {
            Ok(token) => handle_token(state, token),
            Err(_) => rt.sleep(IDLE_SLEEP),
        }

        if rt.monotonic_now().duration_since(last_diagnostic) >= DIAGNOSTIC_INTERVAL {
            last_diagnostic = rt.monotonic_now();
            log_open_decisions_diagnostic(state);
        }
    }
}

fn handle_token(state: &SharedState, token: TriggerDecisionToken) {
    if token.run_number != state.run_number() {
        // Out-of-run token: ignored, not counted (spec.md §9 open question,
        // resolved per "the source ignores; this specification follows").
        return;
    }

    state.add_credit(1);
    crate::metrics::log_credit(state.credit());

    if token.trigger_number.is_valid() {
        if state.retire_open_decision(token.trigger_number) {
            crate::metrics::log_open_decisions(state.open_decisions_snapshot().len());
        } else {
            tracing::warn!(
                trigger_number = token.trigger_number.0,
                "token acknowledges a trigger_number not in the open-decisions set"
            );
        }
    }
}

fn log_open_decisions_diagnostic(state: &SharedState) {
    if state.is_paused() {
        return;
    }
    let open = state.open_decisions_snapshot();
    if open.is_empty() {
        return;
    }
    tracing::info!(open_decisions = ?open, "open decisions awaiting acknowledgement");
}
