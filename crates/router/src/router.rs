//! Event router
//!
//! The notification surface the watch collaborator drives. Each observed
//! change runs through the admission filter, is counted, and is handed to
//! the active sink. Deletions are never forwarded: in this domain they
//! only occur via passive expiry and carry no actionable payload.

use std::sync::Arc;

use evr_filter::EventFilter;
use evr_metrics::EventMetrics;
use evr_protocol::Event;
use evr_sinks::EventSink;

/// Routes observed event changes to the active sink
pub struct EventRouter {
    sink: Arc<dyn EventSink>,
    filter: EventFilter,
    metrics: Arc<EventMetrics>,
}

impl EventRouter {
    /// Create a router over the active sink
    pub fn new(
        sink: Arc<dyn EventSink>,
        filter: EventFilter,
        metrics: Arc<EventMetrics>,
    ) -> Self {
        Self {
            sink,
            filter,
            metrics,
        }
    }

    /// Called when an event is created, or during the initial listing
    pub async fn on_added(&self, event: Event) {
        if !self.filter.passes(&event) {
            tracing::trace!(
                kind = %event.involved_object.kind,
                name = %event.involved_object.name,
                "event filtered out"
            );
            return;
        }

        self.metrics.record(&event);
        self.sink.update_events(&event, None).await;
    }

    /// Called on any update to an existing event
    pub async fn on_updated(&self, old: Event, new: Event) {
        if !self.filter.passes(&new) {
            tracing::trace!(
                kind = %new.involved_object.kind,
                name = %new.involved_object.name,
                "event filtered out"
            );
            return;
        }

        self.metrics.record(&new);
        self.sink.update_events(&new, Some(&old)).await;
    }

    /// Called when the cluster garbage-collects an event via TTL expiry
    pub fn on_deleted(&self, event: &Event) {
        tracing::debug!(
            kind = %event.involved_object.kind,
            name = %event.involved_object.name,
            reason = %event.reason,
            "event deleted from the cluster"
        );
    }
}

#[cfg(test)]
#[path = "router_test.rs"]
mod router_test;
