//! Runtime implementations for abstracting out core systems functionality:
//! spawning the long-lived worker threads and reading wall-clock/monotonic
//! time. See `[Runtime]`.
//!
//! The module's workers are real OS threads (per `spec.md` §5, "parallel
//! threads (or OS-level tasks)"), not async tasks, so this abstraction is a
//! thread-spawning/clock trait rather than the tokio-task abstraction it's
//! grounded on.
use std::time::{
    Duration,
    Instant,
    SystemTime,
};

pub mod prod;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// A handle to a spawned worker thread.
pub trait JoinHandle: Send {
    /// Block until the thread has exited.
    fn join(self);
}

/// Abstracts over "what a worker thread needs from the outside world":
/// spawning itself, sleeping, and reading the current time. Swapping the
/// implementation (`prod::ProdRuntime` vs `testing::TestRuntime`) lets tests
/// drive the estimator's extrapolation deterministically instead of racing
/// the real wall clock.
pub trait Runtime: Clone + Send + Sync + 'static {
    type JoinHandle: JoinHandle;

    /// Spawn a named worker thread running `f` until it returns.
    fn spawn_thread<F>(&self, name: &'static str, f: F) -> Self::JoinHandle
    where
        F: FnOnce() + Send + 'static;

    /// Block the calling thread for `duration`. Every call site in this
    /// workspace bounds `duration` to a few tens of milliseconds at most
    /// (see `spec.md` §5 "Suspension points"), so a worker never blocks
    /// indefinitely here.
    fn sleep(&self, duration: Duration);

    /// Microseconds since the Unix epoch, used to compare against
    /// `TimeSync::system_time`.
    fn system_time_micros(&self) -> u64 {
        self.system_time()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as u64
    }

    fn system_time(&self) -> SystemTime;

    /// A monotonic instant, used only for internal throttling (e.g. "warn at
    /// most once per second"), never for the DAQ-tick estimate itself.
    fn monotonic_now(&self) -> Instant;
}
