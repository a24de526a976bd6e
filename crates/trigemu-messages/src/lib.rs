//! Wire types and typed message endpoints for the trigger-decision emulator.
//!
//! The actual transport (the queueing system that ferries `TimeSync`,
//! `TriggerInhibit`, `TriggerDecisionToken`, and `TriggerDecision` messages
//! between processes) is an out-of-scope external collaborator; this crate
//! only defines the message shapes and a concrete in-process channel
//! (`channel`) that satisfies the send/receive-with-timeout contract the
//! core module is written against.
pub mod channel;
pub mod config;
mod ticks;
mod types;

pub use crate::{
    config::{
        ConfParams,
        ResumeParams,
        StartParams,
    },
    ticks::{
        ClockHz,
        DaqTick,
        GeoId,
        RunNumber,
        SystemMicros,
        TickDelta,
        TriggerNumber,
    },
    types::{
        ComponentRequest,
        TriggerDecision,
        TriggerDecisionToken,
        TriggerInhibit,
        TriggerType,
        TimeSync,
    },
};
