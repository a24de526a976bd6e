//! A deterministic `Runtime` for unit tests: time only advances when the
//! test explicitly asks it to, and `sleep` never blocks the calling thread.
//! This lets tests exercise the estimator's extrapolation math and the
//! scheduler's gating logic without racing the real wall clock.
use std::{
    sync::{
        atomic::{
            AtomicU64,
            Ordering,
        },
        Arc,
    },
    thread,
    time::{
        Duration,
        Instant,
        SystemTime,
    },
};

use crate::{
    JoinHandle as JoinHandleTrait,
    Runtime,
};

#[derive(Clone)]
pub struct TestRuntime {
    base: Instant,
    elapsed_micros: Arc<AtomicU64>,
}

impl TestRuntime {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            elapsed_micros: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Advance the virtual clock by `duration` without blocking.
    pub fn advance(&self, duration: Duration) {
        self.elapsed_micros
            .fetch_add(duration.as_micros() as u64, Ordering::SeqCst);
    }

    fn elapsed(&self) -> Duration {
        Duration::from_micros(self.elapsed_micros.load(Ordering::SeqCst))
    }
}

impl Default for TestRuntime {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TestJoinHandle(thread::JoinHandle<()>);

impl JoinHandleTrait for TestJoinHandle {
    fn join(self) {
        let _ = self.0.join();
    }
}

impl Runtime for TestRuntime {
    type JoinHandle = TestJoinHandle;

    fn spawn_thread<F>(&self, name: &'static str, f: F) -> Self::JoinHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(name.to_owned())
            .spawn(f)
            .expect("failed to spawn worker thread");
        TestJoinHandle(handle)
    }

    fn sleep(&self, duration: Duration) {
        // Tests drive time forward explicitly via `advance`; yield briefly so
        // concurrent threads in the same test make progress instead of
        // spinning.
        self.advance(duration);
        thread::yield_now();
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::UNIX_EPOCH + self.elapsed()
    }

    fn monotonic_now(&self) -> Instant {
        self.base + self.elapsed()
    }
}
