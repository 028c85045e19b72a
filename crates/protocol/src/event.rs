//! Event payload types
//!
//! `Event` is the unit the watch collaborator hands to the router: a
//! timestamped notification about something that happened to a subject
//! resource. The shape mirrors what cluster control planes emit, reduced
//! to the fields the delivery pipeline and its wire formats actually use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity-like classification of an event
///
/// Unknown string values deserialize to `Unknown` rather than failing,
/// since control planes have grown new types over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Routine operation (scheduled, pulled, started, ...)
    Normal,

    /// Something is wrong (failed, unhealthy, evicted, ...)
    Warning,

    /// Informational, emitted by some components
    Info,

    /// Anything else
    #[serde(other)]
    Unknown,
}

impl EventType {
    /// Lower-case label, used as a metrics bucket name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Unknown => "unknown",
        }
    }
}

/// The subject resource an event is about
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Resource kind (e.g. "Pod", "Deployment")
    #[serde(default)]
    pub kind: String,

    /// Resource name
    #[serde(default)]
    pub name: String,

    /// Namespace the resource lives in
    #[serde(default)]
    pub namespace: String,

    /// Unique identifier of the resource
    #[serde(default)]
    pub uid: String,
}

/// The component that reported an event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSource {
    /// Reporting component (e.g. "kubelet", "scheduler")
    #[serde(default)]
    pub component: String,

    /// Node the reporting component ran on
    #[serde(default)]
    pub host: String,
}

/// A cluster event as observed from the watch stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// The resource this event is about
    pub involved_object: ObjectRef,

    /// Machine-readable reason code (e.g. "FailedScheduling")
    #[serde(default)]
    pub reason: String,

    /// Human-readable description
    #[serde(default)]
    pub message: String,

    /// Severity-like classification
    #[serde(rename = "type")]
    pub event_type: EventType,

    /// Component that reported the event
    #[serde(default)]
    pub source: EventSource,

    /// When this event was first observed
    pub first_seen: DateTime<Utc>,

    /// When this event was most recently observed
    pub last_seen: DateTime<Utc>,

    /// Number of occurrences compacted into this event
    #[serde(default)]
    pub count: i32,
}
