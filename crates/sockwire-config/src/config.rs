//! Main configuration type.
//!
//! This module provides the top-level [`SockwireConfig`] struct.

use serde::{Deserialize, Serialize};
use sockwire::ClientConfig;
use sockwire_telemetry::LogConfig;

use crate::{ClientSection, ConfigError, EndpointConfig, LogFormat, LoggingSection};

/// Complete sockwire client configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use sockwire_config::SockwireConfig;
///
/// let config = SockwireConfig::default();
/// assert_eq!(config.endpoint.port, 3000);
/// assert_eq!(config.client.handshake_expiry_secs, 30);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct SockwireConfig {
    /// Server endpoint.
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Client behavior.
    #[serde(default)]
    pub client: ClientSection,

    /// Logging output.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl SockwireConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if:
    /// - The host is empty or the port is 0
    /// - The handshake expiry is 0
    /// - Either buffer size is 0
    /// - The request path does not start with `/`
    /// - A timeout is 0 (use no value to block instead)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.host.trim().is_empty() {
            return Err(ConfigError::invalid_value("endpoint.host", "must not be empty"));
        }

        if self.endpoint.port == 0 {
            return Err(ConfigError::invalid_value("endpoint.port", "must not be 0"));
        }

        let client = &self.client;
        if client.handshake_expiry_secs == 0 {
            return Err(ConfigError::invalid_value(
                "client.handshake_expiry_secs",
                "must be at least 1 second",
            ));
        }

        if !client.request_path.starts_with('/') {
            return Err(ConfigError::invalid_value(
                "client.request_path",
                format!("must start with '/': {}", client.request_path),
            ));
        }

        for (field, size) in [
            ("client.handshake_buffer_size", client.handshake_buffer_size),
            ("client.receive_buffer_size", client.receive_buffer_size),
        ] {
            if size == 0 {
                return Err(ConfigError::invalid_value(field, "must not be 0"));
            }
        }

        for (field, timeout) in [
            ("client.connect_timeout_ms", client.connect_timeout_ms),
            ("client.read_timeout_ms", client.read_timeout_ms),
            ("client.write_timeout_ms", client.write_timeout_ms),
        ] {
            if timeout == Some(0) {
                return Err(ConfigError::invalid_value(
                    field,
                    "must not be 0; omit it to block without a timeout",
                ));
            }
        }

        Ok(())
    }

    /// Create a development preset: pretty debug logs, 5 second socket timeouts.
    ///
    /// # Example
    ///
    /// ```
    /// use sockwire_config::SockwireConfig;
    ///
    /// let config = SockwireConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;

        config.client.connect_timeout_ms = Some(5_000);
        config.client.read_timeout_ms = Some(5_000);
        config.client.write_timeout_ms = Some(5_000);

        config
    }

    /// Create a production preset: JSON info logs, 10 second connect timeout.
    ///
    /// # Example
    ///
    /// ```
    /// use sockwire_config::{LogFormat, SockwireConfig};
    ///
    /// let config = SockwireConfig::production();
    /// assert_eq!(config.logging.format, LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;

        config.client.connect_timeout_ms = Some(10_000);

        config
    }

    /// Runtime configuration for [`sockwire::Connection`].
    pub fn client_config(&self) -> ClientConfig {
        self.client.client_config()
    }

    /// Logging configuration for [`sockwire_telemetry::init_logging`].
    pub fn log_config(&self) -> LogConfig {
        self.logging.log_config()
    }
}
