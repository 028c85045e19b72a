//! Tests for event change records

use chrono::{TimeZone, Utc};

use crate::event::{Event, EventSource, EventType, ObjectRef};
use crate::record::{EventRecord, RecordVerb};

// =============================================================================
// Verb derivation tests
// =============================================================================

#[test]
fn test_record_without_previous_is_added() {
    let record = EventRecord::new(sample_event(1), None);

    assert_eq!(record.verb(), RecordVerb::Added);
    assert!(record.old_event().is_none());
}

#[test]
fn test_record_with_previous_is_updated() {
    let record = EventRecord::new(sample_event(2), Some(sample_event(1)));

    assert_eq!(record.verb(), RecordVerb::Updated);
    assert_eq!(record.old_event().unwrap().count, 1);
}

#[test]
fn test_verb_matches_previous_presence() {
    // verb == Added exactly when there is no previous event, for every
    // construction path there is.
    for old in [None, Some(sample_event(1))] {
        let record = EventRecord::new(sample_event(2), old.clone());
        assert_eq!(record.verb() == RecordVerb::Added, old.is_none());
        assert_eq!(record.old_event().is_some(), old.is_some());
    }
}

// =============================================================================
// Serialization tests
// =============================================================================

#[test]
fn test_added_record_json_shape() {
    let record = EventRecord::new(sample_event(1), None);
    let json = serde_json::to_value(&record).unwrap();

    assert_eq!(json["verb"], "ADDED");
    assert_eq!(json["event"]["reason"], "Started");
    // old_event is omitted entirely, not serialized as null
    assert!(json.get("old_event").is_none());
}

#[test]
fn test_updated_record_json_shape() {
    let record = EventRecord::new(sample_event(3), Some(sample_event(2)));
    let json = serde_json::to_value(&record).unwrap();

    assert_eq!(json["verb"], "UPDATED");
    assert_eq!(json["event"]["count"], 3);
    assert_eq!(json["old_event"]["count"], 2);
}

#[test]
fn test_record_event_accessor() {
    let record = EventRecord::new(sample_event(7), None);
    assert_eq!(record.event().count, 7);
    assert_eq!(record.event().involved_object.kind, "Pod");
}

// =============================================================================
// Helper functions
// =============================================================================

fn sample_event(count: i32) -> Event {
    Event {
        involved_object: ObjectRef {
            kind: "Pod".into(),
            name: "web-1".into(),
            namespace: "default".into(),
            uid: "2f9d7e".into(),
        },
        reason: "Started".into(),
        message: "Started container web".into(),
        event_type: EventType::Normal,
        source: EventSource {
            component: "kubelet".into(),
            host: "node-a".into(),
        },
        first_seen: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
        last_seen: Utc.with_ymd_and_hms(2024, 3, 1, 10, 5, 0).unwrap(),
        count,
    }
}
