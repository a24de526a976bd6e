//! Metric name/help validation, mirroring the naming rules enforced across
//! this workspace's services.
use std::ops::Deref;

const ALLOWED_SUFFIXES: &[&str] = &[
    "_seconds", "_total", "_ticks", "_triggers", "_decisions", "_tokens", "_info",
];

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MetricName(&'static str);

impl MetricName {
    pub const fn new(name: &'static str) -> Self {
        validate_metric_name(name);
        Self(name)
    }
}

impl Deref for MetricName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

const fn ends_with(s: &[u8], suffix: &[u8]) -> bool {
    if s.len() < suffix.len() {
        return false;
    }
    let base = s.len() - suffix.len();
    let mut i = 0;
    while i < suffix.len() {
        if s[base + i] != suffix[i] {
            return false;
        }
        i += 1;
    }
    true
}

const fn validate_metric_name(name: &str) {
    let bytes = name.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        let is_upper = c.is_ascii_uppercase();
        let is_lower = c.is_ascii_lowercase();
        let is_numeric = c.is_ascii_digit();
        if !(is_upper || is_lower || is_numeric || c == b'_') {
            panic!("Metric names can only contain alphanumeric characters and underscores");
        }
        i += 1;
    }
    let mut i = 0;
    let mut found_suffix = false;
    while i < ALLOWED_SUFFIXES.len() {
        if ends_with(bytes, ALLOWED_SUFFIXES[i].as_bytes()) {
            found_suffix = true;
            break;
        }
        i += 1;
    }
    if !found_suffix {
        panic!("Metric names must end with their unit as a suffix (e.g. `_total`, `_seconds`)");
    }
}

#[macro_export]
macro_rules! metric_name {
    ($name:expr) => {{
        const METRIC_NAME: $crate::MetricName = $crate::MetricName::new($name);
        METRIC_NAME
    }};
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MetricHelp(&'static str);

impl MetricHelp {
    pub const fn new(help: &'static str) -> Self {
        if help.is_empty() {
            panic!("Metric help strings must be nonempty");
        }
        Self(help)
    }
}

impl Deref for MetricHelp {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

#[macro_export]
macro_rules! metric_help {
    ($help:literal) => {{
        const METRIC_HELP: $crate::MetricHelp = $crate::MetricHelp::new($help);
        METRIC_HELP
    }};
}
