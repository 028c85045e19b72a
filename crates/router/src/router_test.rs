//! Tests for the event router

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use evr_filter::EventFilter;
use evr_metrics::EventMetrics;
use evr_protocol::{Event, EventSource, EventType, ObjectRef};
use evr_sinks::EventSink;
use tokio::sync::Mutex;

use crate::router::EventRouter;

/// Sink that records every call
#[derive(Default)]
struct RecordingSink {
    calls: Mutex<Vec<(Event, Option<Event>)>>,
}

#[async_trait]
impl EventSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn update_events(&self, new: &Event, old: Option<&Event>) {
        self.calls.lock().await.push((new.clone(), old.cloned()));
    }
}

fn router_with(
    filter: EventFilter,
    metrics_enabled: bool,
) -> (EventRouter, Arc<RecordingSink>, Arc<EventMetrics>) {
    let sink = Arc::new(RecordingSink::default());
    let metrics = Arc::new(EventMetrics::new(metrics_enabled));
    let router = EventRouter::new(sink.clone(), filter, metrics.clone());
    (router, sink, metrics)
}

// =============================================================================
// Forwarding tests
// =============================================================================

#[tokio::test]
async fn test_added_forwards_without_previous() {
    let (router, sink, metrics) = router_with(EventFilter::default(), true);

    router.on_added(event("Pod", "web-1")).await;

    let calls = sink.calls.lock().await;
    assert_eq!(calls.len(), 1);
    assert!(calls[0].1.is_none());
    assert_eq!(metrics.snapshot().total(), 1);
}

#[tokio::test]
async fn test_updated_forwards_with_previous() {
    let (router, sink, _) = router_with(EventFilter::default(), true);

    let mut new = event("Pod", "web-1");
    new.count = 2;
    router.on_updated(event("Pod", "web-1"), new).await;

    let calls = sink.calls.lock().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.count, 2);
    assert_eq!(calls[0].1.as_ref().unwrap().count, 1);
}

#[tokio::test]
async fn test_deleted_is_never_forwarded() {
    let (router, sink, metrics) = router_with(EventFilter::default(), true);

    router.on_deleted(&event("Pod", "web-1"));

    assert!(sink.calls.lock().await.is_empty());
    assert_eq!(metrics.snapshot().total(), 0);
}

// =============================================================================
// Filtering tests
// =============================================================================

#[tokio::test]
async fn test_filtered_event_is_not_forwarded_or_counted() {
    let filter = EventFilter {
        kinds: vec!["Deployment".into()],
        ..Default::default()
    };
    let (router, sink, metrics) = router_with(filter, true);

    router.on_added(event("Pod", "web-1")).await;

    assert!(sink.calls.lock().await.is_empty());
    assert_eq!(metrics.snapshot().total(), 0);
}

#[tokio::test]
async fn test_update_filter_applies_to_new_event() {
    let filter = EventFilter {
        kinds: vec!["Pod".into()],
        ..Default::default()
    };
    let (router, sink, _) = router_with(filter, true);

    router
        .on_updated(event("Pod", "web-1"), event("Pod", "web-1"))
        .await;
    router
        .on_updated(event("Deployment", "api"), event("Deployment", "api"))
        .await;

    assert_eq!(sink.calls.lock().await.len(), 1);
}

// =============================================================================
// Metrics tests
// =============================================================================

#[tokio::test]
async fn test_accepted_events_are_counted_with_labels() {
    let (router, _, metrics) = router_with(EventFilter::default(), true);

    router.on_added(event("Pod", "web-1")).await;
    router.on_added(event("Pod", "web-1")).await;

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.normal_total, 2);
    assert_eq!(snapshot.series.len(), 1);
    assert_eq!(snapshot.series[0].1, 2);
}

#[tokio::test]
async fn test_disabled_metrics_still_forward() {
    let (router, sink, metrics) = router_with(EventFilter::default(), false);

    router.on_added(event("Pod", "web-1")).await;

    assert_eq!(sink.calls.lock().await.len(), 1);
    assert_eq!(metrics.snapshot().total(), 0);
}

// =============================================================================
// Helper functions
// =============================================================================

fn event(kind: &str, name: &str) -> Event {
    Event {
        involved_object: ObjectRef {
            kind: kind.into(),
            name: name.into(),
            namespace: "default".into(),
            uid: "uid-1".into(),
        },
        reason: "Started".into(),
        message: "Started container".into(),
        event_type: EventType::Normal,
        source: EventSource {
            component: "kubelet".into(),
            host: "node-a".into(),
        },
        first_seen: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
        last_seen: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
        count: 1,
    }
}
