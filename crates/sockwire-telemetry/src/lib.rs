//! Logging setup for sockwire.
//!
//! The `sockwire` client instruments its handshakes, frame traffic and
//! reconnects with `tracing`. This crate turns those events into output:
//!
//! - **JSON** lines for production log collection
//! - **Pretty** multi-line text with span events for development
//! - **Compact** single-line text for terminals
//!
//! Filtering uses `EnvFilter` directives, so `sockwire=trace` shows every
//! encoded and decoded frame while `info` keeps only lifecycle events.
//!
//! # Example
//!
//! ```no_run
//! use sockwire_telemetry::{init_logging, LogConfig};
//!
//! # fn main() -> sockwire_telemetry::TelemetryResult<()> {
//! init_logging(&LogConfig::production())?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogOutput, LogWriter};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
