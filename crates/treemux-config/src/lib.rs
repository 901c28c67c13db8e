//! Typed configuration for treemux servers.
//!
//! Configuration is layered: defaults (or a preset), then a TOML or JSON
//! file, then environment variables. Every section rejects unknown fields.
//!
//! - [`ServerConfig`] - bind address, timeouts, body limit
//! - [`RouterConfig`] - wildcard token and declared routes
//! - [`TelemetryConfigSection`] - logging and metrics
//!
//! # Example
//!
//! ```no_run
//! use treemux_config::ConfigLoader;
//!
//! # fn main() -> Result<(), treemux_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("treemux.toml")?
//!     .with_env_prefix("TREEMUX")
//!     .load()?;
//!
//! println!("listening on {}", config.server.http_addr);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 30000
//! max_body_bytes = 1048576
//!
//! [router]
//! wildcard = "*"
//!
//! [[router.routes]]
//! path = "/foo/*"
//! handler = "foo"
//!
//! [[router.routes]]
//! path = "/moo/"
//! handler = "moo"
//!
//! [telemetry]
//! service_name = "my-service"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//!
//! [telemetry.metrics]
//! enabled = true
//! addr = "0.0.0.0:9090"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Scalar values can be overridden with `PREFIX__SECTION__KEY`:
//!
//! - `TREEMUX__SERVER__HTTP_ADDR=0.0.0.0:9000`
//! - `TREEMUX__ROUTER__WILDCARD=:any`
//! - `TREEMUX__TELEMETRY__LOGGING__LEVEL=debug`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
