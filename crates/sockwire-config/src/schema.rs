//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sockwire::config::DEFAULT_REQUEST_PATH;
use sockwire::ClientConfig;
use sockwire_telemetry::{LogConfig, LogOutput};

/// Endpoint section: where the client connects.
///
/// # Example
///
/// ```
/// use sockwire_config::EndpointConfig;
///
/// let endpoint = EndpointConfig {
///     host: "chat.internal".to_string(),
///     port: 3000,
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    /// Host name or address.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Client section: handshake, framing and socket options.
///
/// Durations are plain integers so the section reads naturally in TOML and
/// environment variables. A missing timeout means "block forever".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientSection {
    /// Seconds a handshake stays valid.
    #[serde(default = "default_handshake_expiry")]
    pub handshake_expiry_secs: u64,

    /// Request target of the upgrade request.
    #[serde(default = "default_request_path")]
    pub request_path: String,

    /// `Sec-WebSocket-Version` header value.
    #[serde(default)]
    pub websocket_version: String,

    /// `Origin` header value.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Bytes read for the handshake response.
    #[serde(default = "default_handshake_buffer")]
    pub handshake_buffer_size: usize,

    /// Bytes read for one received frame.
    #[serde(default = "default_receive_buffer")]
    pub receive_buffer_size: usize,

    /// Mask outgoing frames.
    #[serde(default = "default_true")]
    pub mask_frames: bool,

    /// TCP connect timeout in milliseconds.
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,

    /// Socket read timeout in milliseconds.
    #[serde(default)]
    pub read_timeout_ms: Option<u64>,

    /// Socket write timeout in milliseconds.
    #[serde(default)]
    pub write_timeout_ms: Option<u64>,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            handshake_expiry_secs: default_handshake_expiry(),
            request_path: default_request_path(),
            websocket_version: String::new(),
            origin: default_origin(),
            handshake_buffer_size: default_handshake_buffer(),
            receive_buffer_size: default_receive_buffer(),
            mask_frames: true,
            connect_timeout_ms: None,
            read_timeout_ms: None,
            write_timeout_ms: None,
        }
    }
}

impl ClientSection {
    /// Convert to the client's runtime configuration.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new()
            .handshake_expiry(Duration::from_secs(self.handshake_expiry_secs))
            .request_path(self.request_path.clone())
            .websocket_version(self.websocket_version.clone())
            .origin(self.origin.clone())
            .handshake_buffer_size(self.handshake_buffer_size)
            .receive_buffer_size(self.receive_buffer_size)
            .mask_frames(self.mask_frames)
            .connect_timeout(self.connect_timeout_ms.map(Duration::from_millis))
            .read_timeout(self.read_timeout_ms.map(Duration::from_millis))
            .write_timeout(self.write_timeout_ms.map(Duration::from_millis))
    }
}

fn default_handshake_expiry() -> u64 {
    30
}

fn default_request_path() -> String {
    DEFAULT_REQUEST_PATH.to_string()
}

fn default_origin() -> String {
    "*".to_string()
}

fn default_handshake_buffer() -> usize {
    1024
}

fn default_receive_buffer() -> usize {
    1_000_000
}

fn default_true() -> bool {
    true
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
    /// Single-line human-readable format.
    Compact,
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directives (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingSection {
    /// Convert to a telemetry logging configuration.
    ///
    /// Pretty output starts from the development preset, the other formats
    /// from the production preset; level and enablement come from this section.
    pub fn log_config(&self) -> LogConfig {
        let (preset, output) = match self.format {
            LogFormat::Json => (LogConfig::production(), LogOutput::Json),
            LogFormat::Pretty => (LogConfig::development(), LogOutput::Pretty),
            LogFormat::Compact => (LogConfig::production(), LogOutput::Compact),
        };
        LogConfig {
            enabled: self.enabled,
            ..preset.with_filter(self.level.clone()).with_output(output)
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
