//! Main configuration types.
//!
//! This module provides the top-level [`TreeMuxConfig`] struct and its builder.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, LogFormat, RouterConfig, ServerConfig, TelemetryConfigSection};

/// Complete treemux server configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use treemux_config::TreeMuxConfig;
///
/// let config = TreeMuxConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert_eq!(config.router.wildcard, "*");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct TreeMuxConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Router configuration: wildcard token and declared routes.
    #[serde(default)]
    pub router: RouterConfig,

    /// Telemetry configuration (logging, metrics).
    #[serde(default)]
    pub telemetry: TelemetryConfigSection,
}

impl TreeMuxConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> TreeMuxConfigBuilder {
        TreeMuxConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending field:
    /// - a socket address that does not parse
    /// - an empty wildcard, or one containing `/`
    /// - a route with an empty path or handler name
    /// - an empty log level
    ///
    /// An empty path would address the trie root, which only registration in
    /// code (`TreeMux::route("", ..)`) can target. Configured routes always
    /// name at least one segment; `/` registers the trailing empty segment
    /// below the root.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_addr("server.http_addr", &self.server.http_addr)?;

        if self.telemetry.metrics.enabled {
            parse_addr("telemetry.metrics.addr", &self.telemetry.metrics.addr)?;
        }

        let wildcard = &self.router.wildcard;
        if wildcard.is_empty() {
            return Err(ConfigError::invalid_value("router.wildcard", "must not be empty"));
        }
        if wildcard.contains('/') {
            return Err(ConfigError::invalid_value(
                "router.wildcard",
                format!("must not contain '/': {wildcard}"),
            ));
        }

        for (i, route) in self.router.routes.iter().enumerate() {
            if route.path.is_empty() {
                return Err(ConfigError::invalid_value(
                    format!("router.routes[{i}].path"),
                    "must not be empty",
                ));
            }
            if route.handler.is_empty() {
                return Err(ConfigError::invalid_value(
                    format!("router.routes[{i}].handler"),
                    format!("must not be empty (path {})", route.path),
                ));
            }
        }

        if self.telemetry.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "telemetry.logging.level",
                "must not be empty",
            ));
        }

        Ok(())
    }

    /// Development preset: pretty, colored debug logs with source locations.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.server.http_addr = "127.0.0.1:8080".to_string();
        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.logging.ansi_enabled = true;
        config.telemetry.logging.include_location = true;
        config
    }

    /// Production preset: JSON info logs and the Prometheus exporter.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;
        config.telemetry.logging.ansi_enabled = false;
        config.telemetry.metrics.enabled = true;
        config
    }
}

fn parse_addr(field: &str, addr: &str) -> Result<SocketAddr, ConfigError> {
    addr.parse()
        .map_err(|_| ConfigError::invalid_value(field, format!("invalid socket address: {addr}")))
}

/// Builder for [`TreeMuxConfig`].
#[derive(Debug, Default)]
pub struct TreeMuxConfigBuilder {
    server: Option<ServerConfig>,
    router: Option<RouterConfig>,
    telemetry: Option<TelemetryConfigSection>,
}

impl TreeMuxConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server configuration.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Set the router configuration.
    #[must_use]
    pub fn router(mut self, router: RouterConfig) -> Self {
        self.router = Some(router);
        self
    }

    /// Set the telemetry configuration.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetryConfigSection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Build the configuration. Unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> TreeMuxConfig {
        TreeMuxConfig {
            server: self.server.unwrap_or_default(),
            router: self.router.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<TreeMuxConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
