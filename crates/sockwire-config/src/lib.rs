//! Typed configuration for sockwire clients.
//!
//! This crate loads a [`SockwireConfig`] with support for:
//! - TOML and JSON configuration files
//! - `.env` files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! The loaded configuration converts into the runtime types of the other
//! crates: [`SockwireConfig::client_config`] yields a
//! [`sockwire::ClientConfig`] and [`SockwireConfig::log_config`] yields a
//! [`sockwire_telemetry::LogConfig`].
//!
//! # Example
//!
//! ```no_run
//! use sockwire::Connection;
//! use sockwire_config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("sockwire.toml")?
//!     .with_env_prefix("SOCKWIRE")
//!     .load()?;
//!
//! sockwire_telemetry::init_logging(&config.log_config())?;
//! let mut conn = Connection::with_config(
//!     config.endpoint.host.clone(),
//!     config.endpoint.port,
//!     config.client_config(),
//! );
//! conn.emit("hello", &"world")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [endpoint]
//! host = "127.0.0.1"
//! port = 3000
//!
//! [client]
//! handshake_expiry_secs = 30
//! request_path = "/socket.io/?EIO=2&transport=websocket"
//! websocket_version = ""
//! origin = "*"
//! handshake_buffer_size = 1024
//! receive_buffer_size = 1000000
//! mask_frames = true
//! read_timeout_ms = 5000
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Every value can be overridden with `PREFIX__SECTION__KEY`:
//!
//! - `SOCKWIRE__ENDPOINT__HOST=chat.internal`
//! - `SOCKWIRE__CLIENT__HANDSHAKE_EXPIRY_SECS=10`
//! - `SOCKWIRE__CLIENT__READ_TIMEOUT_MS=none`
//! - `SOCKWIRE__LOGGING__FORMAT=pretty`

mod config;
mod error;
mod loader;
mod schema;

pub use config::SockwireConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{ClientSection, EndpointConfig, LogFormat, LoggingSection};
