pub use paste::paste;
pub use prometheus;

/// Register an integer counter with the metrics registry and store it in a
/// static variable. The reported metric name is the lower_snake_case version
/// of the declared variable name.
#[macro_export]
macro_rules! register_trigemu_counter {
    ($VIS:vis $NAME:ident, $HELP:literal $(,)?) => {
        $VIS static $NAME: std::sync::LazyLock<$crate::prometheus::IntCounter> =
            std::sync::LazyLock::new(|| {
                $crate::paste! {
                    let name = $crate::metric_name!(stringify!([<$NAME:lower>]));
                }
                let help = $crate::metric_help!($HELP);
                #[allow(clippy::disallowed_macros)]
                $crate::prometheus::register_int_counter_with_registry!(
                    &*name,
                    &*help,
                    $crate::TRIGEMU_METRICS_REGISTRY,
                )
                .expect("Metric initialization failed")
            });
    };
}

/// Register a floating-point gauge with the metrics registry and store it in
/// a static variable.
#[macro_export]
macro_rules! register_trigemu_gauge {
    ($VIS:vis $NAME:ident, $HELP:literal $(,)?) => {
        $VIS static $NAME: std::sync::LazyLock<$crate::prometheus::Gauge> =
            std::sync::LazyLock::new(|| {
                $crate::paste! {
                    let name = $crate::metric_name!(stringify!([<$NAME:lower>]));
                }
                let help = $crate::metric_help!($HELP);
                #[allow(clippy::disallowed_macros)]
                $crate::prometheus::register_gauge_with_registry!(
                    &*name,
                    &*help,
                    $crate::TRIGEMU_METRICS_REGISTRY,
                )
                .expect("Metric initialization failed")
            });
    };
}
