//! The Inhibit Consumer (`spec.md` §4.2): maintains a single atomic
//! `inhibited` flag reflecting the most recent `TriggerInhibit` observed
//! this run.
use std::time::Duration;

use runtime::Runtime;
use trigemu_messages::{
    channel::EndpointReceiver,
    TriggerInhibit,
};

use crate::state::SharedState;

const RECV_TIMEOUT: Duration = Duration::from_millis(1);
const IDLE_SLEEP: Duration = Duration::from_millis(10);

pub fn run<R, Rx>(state: &SharedState, rt: &R, inhibit_rx: &Rx)
where
    R: Runtime,
    Rx: EndpointReceiver<TriggerInhibit>,
{
    inhibit_rx.drain();

    while state.is_running() {
        match inhibit_rx.recv_timeout(RECV_TIMEOUT) {
            Ok(msg) => state.set_inhibited(msg.busy),
            Err(_) => rt.sleep(IDLE_SLEEP),
        }
    }
}
