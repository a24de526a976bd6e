//! Error taxonomy for the trigger-decision emulator.
//!
//! `TrigemuFault` covers the synchronous faults that a lifecycle command
//! (`configure`/`start`/`resume`) can raise; these leave module state
//! unchanged and are returned to the caller rather than logged-and-ignored.
//! Asynchronous anomalies encountered inside a worker thread (an
//! out-of-order time sync, an unknown trigger token, a send timeout) are
//! *not* represented here: per the module's error handling design they
//! never kill a worker, so they are reported via `tracing::warn!` and a
//! metric at their call site instead of propagated as a `Result`.
mod metrics;

use std::fmt;

pub use thiserror;

/// A fault raised synchronously from `configure`, `start`, or `resume`.
/// Raising one of these leaves the module in its prior state: unconfigured
/// if raised from `configure`, not-started if raised from `start`, and
/// still-paused if raised from `resume`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "testing"), derive(proptest_derive::Arbitrary))]
pub enum TrigemuFault {
    /// A readout-window or link-count range was inverted (`min > max`), or
    /// some other structurally invalid configuration value was supplied.
    #[error("invalid configuration: {reason}")]
    Configuration { reason: String },

    /// `trigger_interval_ticks` was not a positive integer at `start` or
    /// `resume`.
    #[error("invalid trigger interval: {interval} (must be > 0)")]
    InvalidTriggerInterval { interval: i64 },

    /// A command was issued while the module was in a state that does not
    /// permit it (e.g. `start` before `configure`, `resume` while not
    /// paused).
    #[error("command {command} not valid in state {state}")]
    InvalidTransition {
        command: &'static str,
        state: &'static str,
    },
}

impl TrigemuFault {
    pub fn configuration(reason: impl fmt::Display) -> Self {
        metrics::log_configuration_fault();
        Self::Configuration {
            reason: reason.to_string(),
        }
    }

    pub fn invalid_trigger_interval(interval: i64) -> Self {
        metrics::log_trigger_interval_fault();
        Self::InvalidTriggerInterval { interval }
    }

    pub fn invalid_transition(command: &'static str, state: &'static str) -> Self {
        Self::InvalidTransition { command, state }
    }
}
