//! Structured logging for sockwire clients.
//!
//! The client crate only emits `tracing` events; this module installs a
//! global subscriber that renders them. Three renderings are available:
//! JSON lines for log collectors, a pretty multi-line form for local
//! debugging, and a compact single-line form for terminals.
//!
//! # Example
//!
//! ```no_run
//! use sockwire_telemetry::logging::{init_logging, LogConfig};
//!
//! # fn main() -> sockwire_telemetry::TelemetryResult<()> {
//! init_logging(&LogConfig::development().with_filter("sockwire=trace"))?;
//!
//! tracing::info!(host = "127.0.0.1", port = 3000, "connecting");
//! # Ok(())
//! # }
//! ```

use std::io;

use crate::error::TelemetryError;
use crate::TelemetryResult;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// How events are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
    /// Single-line human-readable output.
    Compact,
}

/// Where rendered events are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogWriter {
    /// Standard output.
    #[default]
    Stdout,
    /// Standard error, leaving stdout to the application.
    Stderr,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Install a subscriber at all.
    pub enabled: bool,

    /// `EnvFilter` directives, e.g. `info` or `sockwire::connection=debug`.
    pub filter: String,

    /// Event rendering.
    pub output: LogOutput,

    /// Destination stream.
    pub writer: LogWriter,

    /// Log span open/close events, which brackets every handshake, send and receive.
    pub span_events: bool,

    /// Include file and line of the emitting code.
    pub source_location: bool,

    /// Include thread IDs.
    pub thread_ids: bool,

    /// Include the module path of the emitting code.
    pub include_target: bool,

    /// Service name reported once logging is up.
    pub service_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Pretty debug-level output with span events and source locations.
    #[must_use]
    pub fn development() -> Self {
        Self {
            filter: "debug".to_string(),
            output: LogOutput::Pretty,
            span_events: true,
            source_location: true,
            ..Self::production()
        }
    }

    /// JSON info-level output.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            filter: "info".to_string(),
            output: LogOutput::Json,
            writer: LogWriter::Stdout,
            span_events: false,
            source_location: false,
            thread_ids: false,
            include_target: true,
            service_name: "sockwire".to_string(),
        }
    }

    /// Set the filter directives.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Set the rendering.
    #[must_use]
    pub fn with_output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Set the destination stream.
    #[must_use]
    pub fn with_writer(mut self, writer: LogWriter) -> Self {
        self.writer = writer;
        self
    }

    /// Set the service name.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    fn fmt_span(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }
}

/// Installs the global subscriber described by `config`.
///
/// Does nothing when `config.enabled` is false.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] if `config.filter` cannot be
/// parsed, and [`TelemetryError::LoggingInit`] if a global subscriber is
/// already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.filter)?;
    let layer = match config.writer {
        LogWriter::Stdout => fmt_layer(config, io::stdout),
        LogWriter::Stderr => fmt_layer(config, io::stderr),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::debug!(service = %config.service_name, output = ?config.output, "logging initialized");
    Ok(())
}

fn fmt_layer<W>(config: &LogConfig, writer: W) -> BoxedLayer
where
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let base = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_span_events(config.fmt_span())
        .with_file(config.source_location)
        .with_line_number(config.source_location)
        .with_thread_ids(config.thread_ids)
        .with_target(config.include_target);

    match config.output {
        LogOutput::Json => base.json().boxed(),
        LogOutput::Pretty => base.pretty().boxed(),
        LogOutput::Compact => base.compact().boxed(),
    }
}

/// Parses filter directives into an [`EnvFilter`].
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] naming the rejected directives.
pub fn create_env_filter(directives: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(directives)
        .map_err(|e| TelemetryError::InvalidFilter(format!("{directives}: {e}")))
}
