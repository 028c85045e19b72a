//! Tests for the framed line encoding

use chrono::{TimeZone, Utc};

use crate::error::ProtocolError;
use crate::event::{Event, EventSource, EventType, ObjectRef};
use crate::frame::{decode_framed, encode_framed, encode_framed_into};
use crate::record::EventRecord;

// =============================================================================
// Encoding tests
// =============================================================================

#[test]
fn test_encode_prefix_matches_payload_length() {
    let encoded = encode_framed(&sample_record()).unwrap();

    let space = encoded.iter().position(|&b| b == b' ').unwrap();
    let prefix: usize = std::str::from_utf8(&encoded[..space])
        .unwrap()
        .parse()
        .unwrap();

    assert_eq!(prefix, encoded.len() - space - 1);
}

#[test]
fn test_encode_has_no_trailing_delimiter() {
    let encoded = encode_framed(&sample_record()).unwrap();
    assert_eq!(*encoded.last().unwrap(), b'}');
}

#[test]
fn test_encode_into_appends_and_reports_length() {
    let mut buf = b"prior ".to_vec();
    let written = encode_framed_into(&sample_record(), &mut buf).unwrap();

    assert_eq!(buf.len(), 6 + written);
    assert!(buf.starts_with(b"prior "));
}

#[test]
fn test_encode_deterministic() {
    let record = sample_record();
    assert_eq!(
        encode_framed(&record).unwrap(),
        encode_framed(&record).unwrap()
    );
}

// =============================================================================
// Round-trip tests
// =============================================================================

#[test]
fn test_round_trip_recovers_payload() {
    let record = sample_record();
    let encoded = encode_framed(&record).unwrap();

    let (payload, rest) = decode_framed(&encoded).unwrap();
    assert!(rest.is_empty());

    let decoded: serde_json::Value = serde_json::from_slice(payload).unwrap();
    let original = serde_json::to_value(&record).unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn test_decode_returns_trailing_bytes() {
    let mut stream = encode_framed(&sample_record()).unwrap();
    stream.push(b'\n');
    stream.extend_from_slice(&encode_framed(&sample_record()).unwrap());

    let (_, rest) = decode_framed(&stream).unwrap();
    assert_eq!(rest[0], b'\n');

    let (payload, rest) = decode_framed(&rest[1..]).unwrap();
    assert!(rest.is_empty());
    assert!(payload.starts_with(b"{"));
}

// =============================================================================
// Decode error tests
// =============================================================================

#[test]
fn test_decode_missing_prefix() {
    let err = decode_framed(b"{\"verb\":\"ADDED\"}").unwrap_err();
    assert!(matches!(err, ProtocolError::MissingLengthPrefix));
}

#[test]
fn test_decode_non_numeric_prefix() {
    let err = decode_framed(b"abc {}").unwrap_err();
    assert!(matches!(err, ProtocolError::InvalidLengthPrefix(_)));
}

#[test]
fn test_decode_empty_prefix() {
    let err = decode_framed(b" {}").unwrap_err();
    assert!(matches!(err, ProtocolError::InvalidLengthPrefix(_)));
}

#[test]
fn test_decode_truncated_payload() {
    let err = decode_framed(b"100 {\"verb\":\"ADDED\"}").unwrap_err();
    match err {
        ProtocolError::Truncated { expected, actual } => {
            assert_eq!(expected, 100);
            assert_eq!(actual, 16);
        }
        other => panic!("expected Truncated, got {other:?}"),
    }
}

// =============================================================================
// Helper functions
// =============================================================================

fn sample_record() -> EventRecord {
    let event = Event {
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
        count: 1,
    };

    EventRecord::new(event, None)
}
