//! Pipeline error types

use evr_protocol::ProtocolError;
use thiserror::Error;

/// The consumer side of a queue is gone
#[derive(Debug, Error, PartialEq, Eq)]
#[error("queue closed: consumer is gone")]
pub struct QueueClosed;

/// Errors a transport can report for a batch write
///
/// The classification drives retry behavior: transient failures are worth
/// retrying per the destination's policy, permanent ones are not, and
/// serialization failures belong to the record rather than the transport.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Destination unreachable or it signalled a retryable condition
    #[error("transient delivery failure: {message}")]
    Transient {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Destination rejected the data unrecoverably (bad credentials,
    /// rejected payload); retrying cannot help
    #[error("permanent delivery failure: {message}")]
    Permanent {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A record could not be rendered in the destination's wire format
    #[error(transparent)]
    Serialization(#[from] ProtocolError),
}

impl DeliveryError {
    /// Create a transient error from a message
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
            source: None,
        }
    }

    /// Create a transient error wrapping an underlying cause
    pub fn transient_from(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transient {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a permanent error from a message
    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Permanent {
            message: message.into(),
            source: None,
        }
    }

    /// Create a permanent error wrapping an underlying cause
    pub fn permanent_from(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Permanent {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether a retry could plausibly succeed
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}
