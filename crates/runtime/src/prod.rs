//! Production implementation of the `Runtime` trait: real OS threads and the
//! real wall clock.
use std::{
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

/// Runtime for running in production: spawns real threads and sleeps for
/// wallclock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProdRuntime;

impl ProdRuntime {
    pub fn new() -> Self {
        Self
    }
}

pub struct ProdJoinHandle(thread::JoinHandle<()>);

impl JoinHandleTrait for ProdJoinHandle {
    fn join(self) {
        if let Err(panic) = self.0.join() {
            tracing::error!("Worker thread panicked: {panic:?}");
        }
    }
}

impl Runtime for ProdRuntime {
    type JoinHandle = ProdJoinHandle;

    fn spawn_thread<F>(&self, name: &'static str, f: F) -> Self::JoinHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(name.to_owned())
            .spawn(f)
            .expect("failed to spawn worker thread");
        ProdJoinHandle(handle)
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }

    fn monotonic_now(&self) -> Instant {
        Instant::now()
    }
}
