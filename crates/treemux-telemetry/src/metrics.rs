//! Prometheus metrics for treemux.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `treemux_dispatch_total` | Counter | `outcome`, `status` | Dispatches by match outcome |
//! | `treemux_handler_errors_total` | Counter | - | Handlers that returned an error |
//! | `treemux_http_requests_total` | Counter | `status` | Requests served over HTTP |
//! | `treemux_http_request_duration_seconds` | Histogram | - | End-to-end request latency |
//! | `treemux_http_in_flight_requests` | Gauge | - | Requests being served |
//!
//! The dispatch counters are emitted by `treemux-core`; the HTTP metrics by
//! `treemux-server`.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metric names.
pub mod names {
    /// Dispatch counter, labelled by outcome and status.
    pub const DISPATCH_TOTAL: &str = "treemux_dispatch_total";
    /// Handler error counter.
    pub const HANDLER_ERRORS_TOTAL: &str = "treemux_handler_errors_total";
    /// HTTP request counter, labelled by status.
    pub const HTTP_REQUESTS_TOTAL: &str = "treemux_http_requests_total";
    /// HTTP request latency histogram.
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "treemux_http_request_duration_seconds";
    /// In-flight HTTP requests gauge.
    pub const HTTP_IN_FLIGHT_REQUESTS: &str = "treemux_http_in_flight_requests";
}

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Address to expose metrics on (e.g., "0.0.0.0:9090").
    pub addr: String,

    /// Histogram buckets for request duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "0.0.0.0:9090".to_string(),
            duration_buckets: vec![
                0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ],
        }
    }
}

/// Installs the Prometheus recorder and starts its HTTP listener.
///
/// Must be called from within a Tokio runtime; the listener runs as a
/// spawned task. Does nothing when metrics are disabled.
///
/// # Errors
///
/// Returns `TelemetryError` if the address does not parse, no runtime is
/// available, or a global recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;

    let runtime = tokio::runtime::Handle::try_current()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let (recorder, exporter) = PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Full(names::HTTP_REQUEST_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .build()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let handle = recorder.handle();
    metrics::set_global_recorder(recorder)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    let _ = METRICS_HANDLE.set(handle);

    runtime.spawn(async move {
        if let Err(err) = exporter.await {
            tracing::warn!(error = ?err, "metrics exporter stopped");
        }
    });

    register_metric_descriptions();
    tracing::info!(%addr, "metrics exporter listening");

    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(
        names::DISPATCH_TOTAL,
        "Requests dispatched, by match outcome and response status"
    );
    describe_counter!(
        names::HANDLER_ERRORS_TOTAL,
        "Handlers that returned an error instead of a response"
    );
    describe_counter!(names::HTTP_REQUESTS_TOTAL, "HTTP requests served");
    describe_histogram!(
        names::HTTP_REQUEST_DURATION_SECONDS,
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        names::HTTP_IN_FLIGHT_REQUESTS,
        "HTTP requests currently being served"
    );
}

/// Records a completed HTTP request.
pub fn record_request(status_code: u16, duration: Duration) {
    counter!(names::HTTP_REQUESTS_TOTAL, "status" => status_code.to_string()).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS).record(duration.as_secs_f64());
}

/// Guard that tracks an in-flight request until dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Creates a new guard and increments the in-flight gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!(names::HTTP_IN_FLIGHT_REQUESTS).increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!(names::HTTP_IN_FLIGHT_REQUESTS).decrement(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.addr, "0.0.0.0:9090");
        assert!(config.duration_buckets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_disabled_metrics_is_noop() {
        assert!(init_metrics(&MetricsConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_address() {
        let config = MetricsConfig {
            enabled: true,
            addr: "nowhere".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            init_metrics(&config),
            Err(TelemetryError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_requires_runtime() {
        let config = MetricsConfig {
            enabled: true,
            addr: "127.0.0.1:0".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            init_metrics(&config),
            Err(TelemetryError::MetricsInit(_))
        ));
    }

    #[test]
    fn test_record_functions_dont_panic() {
        record_request(200, Duration::from_millis(10));
        let guard = InFlightGuard::new();
        drop(guard);
    }
}
