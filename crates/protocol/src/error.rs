//! Protocol error types

use thiserror::Error;

/// Errors that can occur when encoding or decoding records
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Record could not be serialized to JSON
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Framed message has no `<byte count><SP>` prefix
    #[error("framed message is missing its length prefix")]
    MissingLengthPrefix,

    /// Length prefix is not an ASCII decimal integer
    #[error("invalid length prefix {0:?}")]
    InvalidLengthPrefix(String),

    /// Length prefix promises more bytes than are available
    #[error("framed message truncated: prefix says {expected} bytes, {actual} available")]
    Truncated { expected: usize, actual: usize },
}

impl ProtocolError {
    /// Create an invalid length prefix error
    #[inline]
    pub fn invalid_prefix(prefix: impl Into<String>) -> Self {
        Self::InvalidLengthPrefix(prefix.into())
    }

    /// Create a truncated message error
    #[inline]
    pub fn truncated(expected: usize, actual: usize) -> Self {
        Self::Truncated { expected, actual }
    }
}
