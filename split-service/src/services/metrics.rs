//! Prometheus metrics for split-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_int_counter, register_int_gauge, CounterVec, IntCounter,
    IntGauge, TextEncoder,
};

/// Split sessions created.
pub static SPLITS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("split_sessions_created_total", "Total split sessions created")
        .expect("Failed to register split_sessions_created_total")
});

/// Split sessions finalized.
pub static SPLITS_FINALIZED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "split_sessions_finalized_total",
        "Total split sessions finalized"
    )
    .expect("Failed to register split_sessions_finalized_total")
});

/// OCR records that needed coercion during normalization.
pub static ITEMS_COERCED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "split_items_coerced_total",
        "Raw receipt records coerced to defaults during normalization"
    )
    .expect("Failed to register split_items_coerced_total")
});

/// Live sessions in the store.
pub static SESSIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("split_sessions_active", "Split sessions currently in memory")
        .expect("Failed to register split_sessions_active")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "split_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register split_errors_total")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&SPLITS_CREATED_TOTAL);
    Lazy::force(&SPLITS_FINALIZED_TOTAL);
    Lazy::force(&ITEMS_COERCED_TOTAL);
    Lazy::force(&SESSIONS_ACTIVE);
    Lazy::force(&ERRORS_TOTAL);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
