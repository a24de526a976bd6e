//! Configuration documents for the three commands that carry one
//! (`configure`, `start`, `resume`), per `spec.md` §6.
use serde::{
    Deserialize,
    Serialize,
};

use crate::ticks::{
    GeoId,
    RunNumber,
};

/// Recognized keys of the opaque configuration document passed to
/// `configure`. Field names match `spec.md` §6 verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfParams {
    pub min_readout_window_ticks: u64,
    pub max_readout_window_ticks: u64,
    pub trigger_window_offset: i64,
    pub min_links_in_request: u32,
    pub max_links_in_request: u32,
    pub trigger_interval_ticks: i64,
    pub trigger_offset: i64,
    pub trigger_delay_ticks: u64,
    pub clock_frequency_hz: u64,
    #[serde(default = "default_repeat_trigger_count")]
    pub repeat_trigger_count: u32,
    #[serde(default)]
    pub stop_burst_count: u32,
    #[serde(default)]
    pub initial_token_count: i64,
    pub links: Vec<GeoId>,
}

fn default_repeat_trigger_count() -> u32 {
    1
}

/// `start` carries the run number and the cadence to run at; both are
/// re-validated against the stored `ConfParams` (`spec.md` §3 "re-validated
/// at start and resume").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartParams {
    pub run: RunNumber,
    pub trigger_interval_ticks: i64,
}

/// `resume` carries only a (possibly unchanged) cadence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeParams {
    pub trigger_interval_ticks: i64,
}

impl ConfParams {
    /// Structural validation performed at `configure` (and re-checked, along
    /// with the interval, at `start`/`resume`). Does not check
    /// `trigger_interval_ticks`: that value arrives later via
    /// `StartParams`/`ResumeParams` and is validated by
    /// [`validate_trigger_interval`] instead.
    pub fn validate(&self) -> Result<(), errors::TrigemuFault> {
        if self.min_readout_window_ticks > self.max_readout_window_ticks {
            return Err(errors::TrigemuFault::configuration(format!(
                "min_readout_window_ticks ({}) > max_readout_window_ticks ({})",
                self.min_readout_window_ticks, self.max_readout_window_ticks
            )));
        }
        if self.min_links_in_request > self.max_links_in_request {
            return Err(errors::TrigemuFault::configuration(format!(
                "min_links_in_request ({}) > max_links_in_request ({})",
                self.min_links_in_request, self.max_links_in_request
            )));
        }
        if self.min_links_in_request as usize > self.links.len() {
            return Err(errors::TrigemuFault::configuration(format!(
                "min_links_in_request ({}) exceeds configured link count ({})",
                self.min_links_in_request,
                self.links.len()
            )));
        }
        Ok(())
    }
}

/// `trigger_interval_ticks > 0` at `start` and `resume` (`spec.md` §4.4).
pub fn validate_trigger_interval(interval: i64) -> Result<(), errors::TrigemuFault> {
    if interval <= 0 {
        return Err(errors::TrigemuFault::invalid_trigger_interval(interval));
    }
    Ok(())
}
