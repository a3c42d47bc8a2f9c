//! Prometheus metrics for the ladder gatekeeper.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! means duplicate metric names, a programming error that should crash at
//! first use rather than silently drop metrics.

use crate::error::TelemetryResult;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram, CounterVec, Encoder, Gauge,
    Histogram, TextEncoder,
};

/// Kill switch state (1 = enabled).
pub static LADDER_ENABLED: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("ladder_enabled", "Entry gatekeeper enabled (1=enabled)").unwrap()
});

/// Entries denied, by the gate that denied them.
pub static GATE_BLOCKED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ladder_gate_blocked_total",
        "Total entries denied per gate",
        &["gate"]
    )
    .unwrap()
});

/// Entries admitted, by bucket.
pub static ENTRY_ALLOWED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ladder_entry_allowed_total",
        "Total entries admitted per bucket",
        &["bucket"]
    )
    .unwrap()
});

/// External lookups that timed out.
pub static LOOKUP_TIMEOUT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ladder_lookup_timeout_total",
        "Total external lookups that timed out",
        &["lookup"]
    )
    .unwrap()
});

/// External lookups that returned an error.
pub static LOOKUP_FAILED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ladder_lookup_failed_total",
        "Total external lookups that failed",
        &["lookup"]
    )
    .unwrap()
});

/// Wall time of a full `allow_entry` evaluation.
pub static EVALUATION_LATENCY_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "ladder_evaluation_latency_ms",
        "Entry evaluation latency in milliseconds",
        vec![1.0, 5.0, 10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0]
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record the kill switch state.
    pub fn set_enabled(enabled: bool) {
        LADDER_ENABLED.set(if enabled { 1.0 } else { 0.0 });
    }

    /// Record a denial.
    pub fn gate_blocked(gate: &str) {
        GATE_BLOCKED_TOTAL.with_label_values(&[gate]).inc();
    }

    /// Record an admitted entry.
    pub fn entry_allowed(bucket: &str) {
        ENTRY_ALLOWED_TOTAL.with_label_values(&[bucket]).inc();
    }

    pub fn lookup_timeout(lookup: &str) {
        LOOKUP_TIMEOUT_TOTAL.with_label_values(&[lookup]).inc();
    }

    pub fn lookup_failed(lookup: &str) {
        LOOKUP_FAILED_TOTAL.with_label_values(&[lookup]).inc();
    }

    pub fn evaluation_latency(latency_ms: f64) {
        EVALUATION_LATENCY_MS.observe(latency_ms);
    }

    /// Render the default registry in Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
