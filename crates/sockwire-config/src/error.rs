//! Errors raised while assembling a [`SockwireConfig`](crate::SockwireConfig).

use std::path::PathBuf;
use thiserror::Error;

/// A configuration layer could not be applied, or the result is invalid.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `with_file` was pointed at a path that does not exist.
    #[error("no configuration file at {}", path.display())]
    FileNotFound {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// The file exists but reading it failed.
    #[error("cannot read {}", path.display())]
    ReadError {
        /// The path being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A `.env` file exists but could not be loaded.
    #[error("cannot load .env file: {0}")]
    Dotenv(String),

    /// TOML syntax error or schema mismatch (including unknown fields).
    #[error("invalid TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON syntax error or schema mismatch (including unknown fields).
    #[error("invalid JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Neither TOML nor JSON.
    #[error("unsupported configuration format {0:?}, expected toml or json")]
    UnsupportedFormat(String),

    /// An override variable could not be parsed into its field type.
    #[error("environment override {var}: {reason}")]
    EnvParseError {
        /// The full variable name.
        var: String,
        /// What was expected.
        reason: String,
    },

    /// A value parsed but failed validation.
    #[error("{field} is invalid: {reason}")]
    InvalidValue {
        /// Dotted field path, e.g. `client.receive_buffer_size`.
        field: String,
        /// The rule that was broken.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub(crate) fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Build an [`InvalidValue`](Self::InvalidValue) error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
