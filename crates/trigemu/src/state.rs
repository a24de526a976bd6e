//! Shared state touched by more than one worker. Every field here is either
//! a single-word atomic or (for the open-decisions set) guarded by exactly
//! one dedicated mutex, per `spec.md` §5 "Shared state" and "Resource
//! policy": no worker ever sleeps or sends while holding `open_decisions`.
use std::{
    collections::BTreeSet,
    sync::atomic::{
        AtomicBool,
        AtomicI64,
        AtomicU64,
        Ordering,
    },
};

use parking_lot::Mutex;
use trigemu_messages::{
    DaqTick,
    RunNumber,
    TriggerNumber,
};

/// Snapshot returned by the info surface (`spec.md` §6). The "new" fields
/// are exchange-zeroed on read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InfoSnapshot {
    pub triggers_total: u64,
    pub new_triggers_since_last_query: u64,
    pub inhibited_total: u64,
    pub new_inhibited_since_last_query: u64,
}

/// State shared across the estimator, inhibit consumer, token consumer, and
/// scheduler for one run of the module. A fresh `SharedState` is built at
/// every `start` (`spec.md` §3 "the open-decisions set is cleared at
/// start").
pub struct SharedState {
    estimate: AtomicU64,
    credit: AtomicI64,
    inhibited: AtomicBool,
    paused: AtomicBool,
    running: AtomicBool,
    run_number: AtomicU64,
    last_trigger_number: AtomicU64,
    trigger_interval_ticks: AtomicI64,
    open_decisions: Mutex<BTreeSet<u64>>,

    triggers_total: AtomicU64,
    new_triggers_since_last_query: AtomicU64,
    inhibited_total: AtomicU64,
    new_inhibited_since_last_query: AtomicU64,
    dropped_decisions_total: AtomicU64,
}

impl SharedState {
    pub fn new(run_number: RunNumber, initial_interval: i64, initial_credit: i64) -> Self {
        Self {
            estimate: AtomicU64::new(DaqTick::INVALID.0),
            credit: AtomicI64::new(initial_credit),
            inhibited: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            running: AtomicBool::new(true),
            run_number: AtomicU64::new(run_number.0),
            last_trigger_number: AtomicU64::new(0),
            trigger_interval_ticks: AtomicI64::new(initial_interval),
            open_decisions: Mutex::new(BTreeSet::new()),
            triggers_total: AtomicU64::new(0),
            new_triggers_since_last_query: AtomicU64::new(0),
            inhibited_total: AtomicU64::new(0),
            new_inhibited_since_last_query: AtomicU64::new(0),
            dropped_decisions_total: AtomicU64::new(0),
        }
    }

    // -- estimate: written by the estimator, read by the scheduler ---------

    pub fn load_estimate(&self) -> DaqTick {
        DaqTick(self.estimate.load(Ordering::Acquire))
    }

    pub fn store_estimate(&self, tick: DaqTick) {
        self.estimate.store(tick.0, Ordering::Release);
    }

    // -- run control ---------------------------------------------------

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn run_number(&self) -> RunNumber {
        RunNumber(self.run_number.load(Ordering::Relaxed))
    }

    // -- inhibit / pause -------------------------------------------------

    pub fn is_inhibited(&self) -> bool {
        self.inhibited.load(Ordering::Acquire)
    }

    pub fn set_inhibited(&self, busy: bool) {
        self.inhibited.store(busy, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }

    // -- credit ----------------------------------------------------------

    pub fn credit(&self) -> i64 {
        self.credit.load(Ordering::Acquire)
    }

    pub fn add_credit(&self, delta: i64) {
        self.credit.fetch_add(delta, Ordering::AcqRel);
    }

    /// Attempt to consume one credit. Returns `true` and decrements if
    /// credit was strictly positive; otherwise leaves credit unchanged and
    /// returns `false`. `spec.md` §3/§5 declare credit non-negative as a
    /// hard invariant, so this never decrements past zero (unlike a bare
    /// `fetch_sub`, which would and then never re-trip the `credit == 0`
    /// gate again).
    pub fn try_take_credit(&self) -> bool {
        self.credit
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| {
                if c > 0 {
                    Some(c - 1)
                } else {
                    None
                }
            })
            .is_ok()
    }

    // -- trigger interval (resume/configure writer, scheduler reader) ----

    pub fn trigger_interval_ticks(&self) -> i64 {
        self.trigger_interval_ticks.load(Ordering::Acquire)
    }

    pub fn set_trigger_interval_ticks(&self, interval: i64) {
        self.trigger_interval_ticks.store(interval, Ordering::Release);
    }

    // -- trigger numbers ---------------------------------------------------

    /// Reserve `count` contiguous trigger numbers, returning the first one.
    pub fn reserve_trigger_numbers(&self, count: u64) -> TriggerNumber {
        let first = self.last_trigger_number.fetch_add(count, Ordering::AcqRel) + 1;
        TriggerNumber(first)
    }

    // -- open decisions ----------------------------------------------------

    pub fn insert_open_decision(&self, trigger_number: TriggerNumber) {
        self.open_decisions.lock().insert(trigger_number.0);
    }

    /// Remove `trigger_number` from the open-decisions set, returning
    /// whether it was present.
    pub fn retire_open_decision(&self, trigger_number: TriggerNumber) -> bool {
        self.open_decisions.lock().remove(&trigger_number.0)
    }

    pub fn open_decisions_snapshot(&self) -> Vec<u64> {
        self.open_decisions.lock().iter().copied().collect()
    }

    // -- metrics -----------------------------------------------------------

    pub fn record_trigger_emitted(&self) {
        self.triggers_total.fetch_add(1, Ordering::Relaxed);
        self.new_triggers_since_last_query.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inhibited_grid_point(&self) {
        self.inhibited_total.fetch_add(1, Ordering::Relaxed);
        self.new_inhibited_since_last_query.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_decision(&self) {
        self.dropped_decisions_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_decisions_total(&self) -> u64 {
        self.dropped_decisions_total.load(Ordering::Relaxed)
    }

    /// The info surface's on-demand query: reads the totals and
    /// exchange-zeroes the "new since last query" counters.
    pub fn info_snapshot(&self) -> InfoSnapshot {
        InfoSnapshot {
            triggers_total: self.triggers_total.load(Ordering::Relaxed),
            new_triggers_since_last_query: self.new_triggers_since_last_query.swap(0, Ordering::Relaxed),
            inhibited_total: self.inhibited_total.load(Ordering::Relaxed),
            new_inhibited_since_last_query: self
                .new_inhibited_since_last_query
                .swap(0, Ordering::Relaxed),
        }
    }
}
