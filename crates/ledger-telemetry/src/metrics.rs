//! Prometheus metrics for the ledger gateway.
//!
//! All metrics follow the naming convention: `<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., ledger_proposals_total)
//! - **Gauge**: Value that can go up or down (e.g., ledger_commit_listeners_active)
//! - **Histogram**: Distribution of values (e.g., ledger_commit_wait_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Metrics registry for this process
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // PIPELINE METRICS
    // =========================================================================

    /// Per-peer proposal outcomes
    pub static ref PROPOSALS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("ledger_proposals_total", "Proposal outcomes per peer slot"),
        &["outcome"]  // endorsed / rejected / unreachable
    ).expect("metric creation failed");

    /// invoke/query outcomes
    pub static ref INVOCATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("ledger_invocations_total", "Pipeline operations by outcome"),
        &["operation", "outcome"]
    ).expect("metric creation failed");

    /// Time from listener registration to resolution
    pub static ref COMMIT_WAIT_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "ledger_commit_wait_seconds",
            "Time spent waiting for commit events"
        ).buckets(exponential_buckets(0.01, 2.0, 12).expect("bucket layout"))
    ).expect("metric creation failed");

    /// Live commit listener registrations
    pub static ref COMMIT_LISTENERS_ACTIVE: Gauge = Gauge::new(
        "ledger_commit_listeners_active",
        "Number of registered commit listeners"
    ).expect("metric creation failed");

    // =========================================================================
    // GATEWAY METRICS
    // =========================================================================

    /// HTTP requests by route and status
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("gateway_http_requests_total", "HTTP requests by route and status"),
        &["route", "status"]
    ).expect("metric creation failed");
}

/// Handle returned once metrics are registered.
pub struct MetricsHandle {
    _registry: Registry,
}

/// Register all metrics with the process registry.
///
/// Registering twice is harmless; already-registered collectors are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(PROPOSALS_TOTAL.clone()),
        Box::new(INVOCATIONS_TOTAL.clone()),
        Box::new(COMMIT_WAIT_SECONDS.clone()),
        Box::new(COMMIT_LISTENERS_ACTIVE.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: REGISTRY.clone(),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
