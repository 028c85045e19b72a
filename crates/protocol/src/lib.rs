//! evrouter protocol - Core record types and wire formats
//!
//! This crate provides the types that flow through the delivery pipeline:
//! - `Event` - a cluster event payload with its involved object and source
//! - `EventRecord` - an observed change (added or updated) over an event
//! - Framed line encoding - `<byte count><SP><JSON payload>` messages
//! - Flattened encoding - a single-level JSON object for columnar stores
//!
//! # Design Principles
//!
//! - **Immutable records**: an `EventRecord` cannot be modified after
//!   construction, so producers and the drain consumer share them freely
//! - **Verb by construction**: the verb is derived from the presence of a
//!   previous event, making `Added`-with-previous unrepresentable
//! - **Deterministic output**: both wire formats produce identical bytes
//!   for identical records, which golden-file tests rely on

mod error;
mod event;
mod flatten;
mod frame;
mod record;

pub use error::ProtocolError;
pub use event::{Event, EventSource, EventType, ObjectRef};
pub use flatten::{FLATTEN_DELIMITER, encode_flattened};
pub use frame::{decode_framed, encode_framed, encode_framed_into};
pub use record::{EventRecord, RecordVerb};

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod frame_test;
#[cfg(test)]
mod record_test;
