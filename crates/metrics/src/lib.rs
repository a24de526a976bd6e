//! Code for interacting with this workspace's metrics logging.
//!
//! We follow [Prometheus's conventions](https://prometheus.io/docs/practices/naming/)
//! for metric names:
//!
//! 1. Metrics may only contain alphanumerics and underscores.
//! 2. Metrics are automatically prefixed with `SERVICE_NAME`.
//! 3. Suffix metrics with their units (e.g. `_seconds`, `_total`).
//!    See `metrics::ALLOWED_SUFFIXES` for the full list.
//!
//! All metrics code for a crate goes in a `metrics` module; the interface it
//! exposes to the rest of the crate should be high-level ("this event
//! happened") rather than a raw `f64` logged against a metric name.
use std::{
    collections::HashSet,
    sync::LazyLock,
};

use parking_lot::RwLock;
use prometheus::Registry;

mod macros;
mod metrics;
mod reporting;

pub use crate::{
    macros::*,
    metrics::{
        MetricHelp,
        MetricName,
    },
    reporting::{
        get_desc,
        log_counter,
        log_gauge,
    },
};

/// Use the executable name to identify the service emitting metrics.
pub static SERVICE_NAME: LazyLock<String> = LazyLock::new(|| {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "trigemu".to_owned())
        .replace('-', "_")
});

pub static TRIGEMU_METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(|| {
    Registry::new_custom(Some(SERVICE_NAME.clone()), None)
        .expect("Failed to initialize Prometheus metrics registry")
});

static METRICS_ERROR_ONCE: LazyLock<RwLock<HashSet<String>>> = LazyLock::new(Default::default);

/// Record that a metric failed to update, logging it once per metric name so
/// a misbehaving metric can't spam the logs.
pub fn log_invalid_metric(name: String, error: prometheus::Error) {
    if METRICS_ERROR_ONCE.read().contains(&name) {
        return;
    }
    if METRICS_ERROR_ONCE.write().insert(name.clone()) {
        tracing::error!("Failed to record metric {name:?}: {error}");
    }
}
