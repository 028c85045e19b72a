//! Configuration error types

use std::io;

use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
///
/// These are the only errors allowed to terminate the process, and only
/// at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("failed to read config file '{path}': {source}")]
    Io {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The `sink` key names a destination that does not exist
    #[error("unknown sink '{sink}' (expected one of: log, stdout, http, syslog, kafka, s3, influxdb, elasticsearch, eventhub)")]
    UnknownSink {
        /// The unrecognized name
        sink: String,
    },

    /// The selected sink has no configuration section
    #[error("sink '{sink}' is selected but has no [{sink}] section")]
    MissingSection {
        /// The selected sink
        sink: &'static str,
    },

    /// A required destination setting is missing or empty
    #[error("sink '{sink}' is missing required field '{field}'")]
    MissingField {
        /// The selected sink
        sink: &'static str,
        /// Missing field name
        field: &'static str,
    },

    /// A destination setting has an invalid value
    #[error("sink '{sink}' has invalid {field}: {message}")]
    InvalidValue {
        /// The selected sink
        sink: &'static str,
        /// Field name
        field: &'static str,
        /// What is wrong with it
        message: String,
    },
}

impl ConfigError {
    /// Create an UnknownSink error
    pub fn unknown_sink(sink: impl Into<String>) -> Self {
        Self::UnknownSink { sink: sink.into() }
    }

    /// Create a MissingSection error
    pub fn missing_section(sink: &'static str) -> Self {
        Self::MissingSection { sink }
    }

    /// Create a MissingField error
    pub fn missing_field(sink: &'static str, field: &'static str) -> Self {
        Self::MissingField { sink, field }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(
        sink: &'static str,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            sink,
            field,
            message: message.into(),
        }
    }
}
