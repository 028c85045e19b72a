//! Event change records
//!
//! An `EventRecord` pairs an observed event with the verb describing how it
//! arrived (added vs updated) and, for updates, the previous version of the
//! payload. Records are the unit that flows through the queue and out to
//! the destination adapters.

use serde::Serialize;

use crate::event::Event;

/// How an event entered the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordVerb {
    /// First time this event was observed
    Added,

    /// A previously observed event changed (count bump, new message, ...)
    Updated,
}

/// An immutable observed change over an event
///
/// Constructed once at admission time and never modified afterwards, so it
/// can cross the producer/consumer boundary without locking.
///
/// # Invariant
///
/// `verb == Added` exactly when there is no previous event. `new` is the
/// only constructor, so the invariant holds for every record in existence.
///
/// # Wire form
///
/// ```json
/// {"verb":"UPDATED","event":{...},"old_event":{...}}
/// ```
///
/// `old_event` is omitted entirely for added records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    verb: RecordVerb,

    event: Event,

    #[serde(skip_serializing_if = "Option::is_none")]
    old_event: Option<Event>,
}

impl EventRecord {
    /// Build a record from a new payload and an optional previous payload
    ///
    /// Total: every combination of inputs produces a valid record.
    pub fn new(event: Event, old_event: Option<Event>) -> Self {
        let verb = if old_event.is_none() {
            RecordVerb::Added
        } else {
            RecordVerb::Updated
        };

        Self {
            verb,
            event,
            old_event,
        }
    }

    /// The verb describing how this record entered the stream
    #[inline]
    pub fn verb(&self) -> RecordVerb {
        self.verb
    }

    /// The event payload as observed
    #[inline]
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// The previous payload, present only for updated records
    #[inline]
    pub fn old_event(&self) -> Option<&Event> {
        self.old_event.as_ref()
    }
}
