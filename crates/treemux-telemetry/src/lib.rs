//! Logging and metrics for treemux.
//!
//! - **Logging**: structured JSON (or pretty) output via `tracing-subscriber`
//! - **Metrics**: Prometheus exposition via the `metrics` crate
//!
//! # Example
//!
//! ```rust,ignore
//! use treemux_telemetry::{init_telemetry, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), treemux_telemetry::TelemetryError> {
//!     let config = TelemetryConfig::builder()
//!         .service_name("my-service")
//!         .metrics_addr("0.0.0.0:9090")
//!         .build();
//!     init_telemetry(&config)?;
//!     Ok(())
//! }
//! ```
//!
//! # Metrics Endpoint
//!
//! ```text
//! # HELP treemux_dispatch_total Requests dispatched, by match outcome and response status
//! # TYPE treemux_dispatch_total counter
//! treemux_dispatch_total{outcome="matched",status="200"} 1234
//! treemux_dispatch_total{outcome="not_found",status="404"} 56
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, render_metrics, InFlightGuard, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}
