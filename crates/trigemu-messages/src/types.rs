//! Message shapes exchanged between the emulator and its (out-of-scope)
//! peers. Grounded in `examples/original_source/include/trigemu/Messages_dummy.hpp`
//! and the plugin headers under `examples/original_source/plugins/`.
use serde::{
    Deserialize,
    Serialize,
};

use crate::ticks::{
    DaqTick,
    GeoId,
    RunNumber,
    SystemMicros,
    TriggerNumber,
};

/// An observation binding a DAQ tick to the wall-clock microsecond at which
/// it was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSync {
    pub daq_time: DaqTick,
    pub system_time: SystemMicros,
}

/// Downstream data-flow backpressure. `busy = true` means "stop issuing new
/// decisions until further notice"; the flag is edge-free, only the latest
/// message matters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerInhibit {
    pub busy: bool,
}

/// A unit of downstream readout capacity, optionally acknowledging
/// completion of a specific prior decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDecisionToken {
    pub run_number: RunNumber,
    pub trigger_number: TriggerNumber,
}

/// Readout window for one detector component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRequest {
    pub component: GeoId,
    pub window_begin: DaqTick,
    pub window_end: DaqTick,
}

/// An opaque, constant-per-configuration trigger type code. Trigger physics
/// is out of scope (`spec.md` §1 Non-goals); this is carried through
/// unchanged from configuration to every emitted decision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerType(pub u32);

/// Instructs downstream readout to capture a window of data from a set of
/// detector components.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDecision {
    pub trigger_number: TriggerNumber,
    pub run_number: RunNumber,
    pub trigger_timestamp: DaqTick,
    pub trigger_type: TriggerType,
    pub components: Vec<ComponentRequest>,
}
