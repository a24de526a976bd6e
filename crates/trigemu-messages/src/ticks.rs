//! DAQ-tick and identifier newtypes. Kept as thin wrappers (rather than bare
//! `u64`/`i64`) so the estimator, scheduler, and sampling code can't
//! accidentally mix a tick count with a run number or a microsecond value.
use std::fmt;

/// A 64-bit DAQ tick count. `DaqTick::INVALID` ("no estimate yet") is the
/// all-ones sentinel from `spec.md` §3, not `0`, since `0` is itself a valid
/// tick.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct DaqTick(pub u64);

impl DaqTick {
    pub const INVALID: DaqTick = DaqTick(u64::MAX);

    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }

    pub fn checked_sub(self, other: DaqTick) -> Option<TickDelta> {
        let diff = self.0 as i128 - other.0 as i128;
        i64::try_from(diff).ok().map(TickDelta)
    }
}

impl fmt::Display for DaqTick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "INVALID")
        }
    }
}

impl std::ops::Add<u64> for DaqTick {
    type Output = DaqTick;

    fn add(self, rhs: u64) -> DaqTick {
        DaqTick(self.0 + rhs)
    }
}

impl std::ops::Sub<u64> for DaqTick {
    type Output = DaqTick;

    fn sub(self, rhs: u64) -> DaqTick {
        DaqTick(self.0 - rhs)
    }
}

/// A signed difference between two `DaqTick`s.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct TickDelta(pub i64);

/// Microseconds since the Unix epoch, shared between sync-message producers
/// and this process's wall clock.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct SystemMicros(pub u64);

impl SystemMicros {
    pub fn checked_sub(self, other: SystemMicros) -> Option<u64> {
        self.0.checked_sub(other.0)
    }
}

/// Ticks per second. Always positive; constructed only through
/// `ClockHz::new`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockHz(u64);

impl ClockHz {
    pub fn new(hz: u64) -> Option<Self> {
        (hz > 0).then_some(Self(hz))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct RunNumber(pub u64);

/// A strictly-increasing-within-a-run trigger identifier.
/// `TriggerNumber::INVALID` marks "no specific trigger" in a
/// `TriggerDecisionToken`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TriggerNumber(pub u64);

impl TriggerNumber {
    pub const INVALID: TriggerNumber = TriggerNumber(u64::MAX);

    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }

    pub fn next(self) -> TriggerNumber {
        TriggerNumber(self.0 + 1)
    }
}

/// An opaque detector-component identifier (region/subsystem/element). The
/// scheduler treats the configured set of these as an unordered bag.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct GeoId(pub u32);
