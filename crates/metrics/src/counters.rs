//! Accepted-event counters

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use evr_protocol::{Event, EventType};
use parking_lot::Mutex;
use serde::Serialize;

/// Label set identifying one counter series
///
/// One series per distinct combination of the involved object, reason,
/// reporting host, and event type observed at admission time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EventKey {
    /// Involved-object kind
    pub kind: String,

    /// Involved-object name
    pub name: String,

    /// Involved-object namespace
    pub namespace: String,

    /// Event reason code
    pub reason: String,

    /// Reporting host
    pub host: String,

    /// Type bucket label (normal/warning/info/unknown)
    pub event_type: &'static str,
}

impl EventKey {
    fn from_event(event: &Event) -> Self {
        Self {
            kind: event.involved_object.kind.clone(),
            name: event.involved_object.name.clone(),
            namespace: event.involved_object.namespace.clone(),
            reason: event.reason.clone(),
            host: event.source.host.clone(),
            event_type: event.event_type.as_str(),
        }
    }
}

/// Registry of accepted-event counters
///
/// Constructed at startup and shared (via `Arc`) into the admission path.
/// A disabled registry counts nothing and costs nothing.
#[derive(Debug, Default)]
pub struct EventMetrics {
    enabled: bool,

    normal_total: AtomicU64,
    warning_total: AtomicU64,
    info_total: AtomicU64,
    unknown_total: AtomicU64,

    by_series: Mutex<HashMap<EventKey, u64>>,
}

impl EventMetrics {
    /// Create a registry
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    /// Whether this registry is counting
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Count one accepted event
    pub fn record(&self, event: &Event) {
        if !self.enabled {
            return;
        }

        let bucket = match event.event_type {
            EventType::Normal => &self.normal_total,
            EventType::Warning => &self.warning_total,
            EventType::Info => &self.info_total,
            EventType::Unknown => &self.unknown_total,
        };
        bucket.fetch_add(1, Ordering::Relaxed);

        let key = EventKey::from_event(event);
        *self.by_series.lock().entry(key).or_insert(0) += 1;
    }

    /// Take a snapshot of every counter
    pub fn snapshot(&self) -> EventMetricsSnapshot {
        let mut series: Vec<(EventKey, u64)> = self
            .by_series
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        series.sort();

        EventMetricsSnapshot {
            normal_total: self.normal_total.load(Ordering::Relaxed),
            warning_total: self.warning_total.load(Ordering::Relaxed),
            info_total: self.info_total.load(Ordering::Relaxed),
            unknown_total: self.unknown_total.load(Ordering::Relaxed),
            series,
        }
    }
}

/// Point-in-time snapshot of the registry
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventMetricsSnapshot {
    pub normal_total: u64,
    pub warning_total: u64,
    pub info_total: u64,
    pub unknown_total: u64,

    /// Labeled series, sorted for deterministic output
    pub series: Vec<(EventKey, u64)>,
}

impl EventMetricsSnapshot {
    /// Sum of all type buckets
    pub fn total(&self) -> u64 {
        self.normal_total + self.warning_total + self.info_total + self.unknown_total
    }
}
