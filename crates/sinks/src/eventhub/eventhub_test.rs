//! Tests for the event hub sink

use std::time::Duration;

use chrono::{TimeZone, Utc};
use evr_config::{EventHubSinkConfig, RetrySettings};
use evr_pipeline::BatchTransport;
use evr_protocol::{Event, EventRecord, EventSource, EventType, ObjectRef};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::eventhub::{EventHubTransport, pack_chunks};
use crate::retry::RetryPolicy;

// =============================================================================
// Chunk packing tests
// =============================================================================

#[test]
fn test_small_batch_is_one_chunk() {
    let records: Vec<EventRecord> = (0..5).map(record).collect();

    let chunks = pack_chunks(&records, 1_046_528);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].iter().filter(|&&b| b == b'\n').count(), 4);
}

#[test]
fn test_empty_batch_packs_nothing() {
    assert!(pack_chunks(&[], 1_046_528).is_empty());
}

#[test]
fn test_chunks_split_at_size_boundary() {
    let records: Vec<EventRecord> = (0..10).map(record).collect();
    let one_size = serde_json::to_vec(&records[0]).unwrap().len();

    // Room for three records (plus separators) per chunk
    let max = one_size * 3 + 2;
    let chunks = pack_chunks(&records, max);

    assert!(chunks.len() >= 3, "expected multiple chunks, got {}", chunks.len());
    for chunk in &chunks {
        assert!(chunk.len() <= max, "chunk of {} exceeds {max}", chunk.len());
    }

    // No records lost across the split
    let total: usize = chunks
        .iter()
        .map(|c| c.iter().filter(|&&b| b == b'\n').count() + 1)
        .sum();
    assert_eq!(total, 10);
}

#[test]
fn test_oversized_record_becomes_own_chunk() {
    let mut big = sample_event(0);
    big.message = "x".repeat(4096);
    let records = vec![
        EventRecord::new(sample_event(1), None),
        EventRecord::new(big, None),
        EventRecord::new(sample_event(2), None),
    ];

    let chunks = pack_chunks(&records, 1024);

    // The oversized record cannot be split, so it ships alone
    assert_eq!(chunks.len(), 3);
    assert!(chunks[1].len() > 1024);
}

#[test]
fn test_chunks_preserve_record_order() {
    let records: Vec<EventRecord> = (0..6).map(record).collect();
    let one_size = serde_json::to_vec(&records[0]).unwrap().len();

    let chunks = pack_chunks(&records, one_size * 2 + 1);

    let mut counts = Vec::new();
    for chunk in &chunks {
        for line in chunk.split(|&b| b == b'\n') {
            let json: serde_json::Value = serde_json::from_slice(line).unwrap();
            counts.push(json["event"]["count"].as_i64().unwrap());
        }
    }
    assert_eq!(counts, vec![0, 1, 2, 3, 4, 5]);
}

// =============================================================================
// Transport tests
// =============================================================================

fn transport(server: &MockServer, max_message_size: usize) -> EventHubTransport {
    let config = EventHubSinkConfig {
        endpoint: server.uri(),
        sas_token: "SharedAccessSignature sr=test".into(),
        max_message_size,
        request_timeout: Duration::from_secs(2),
        retry: RetrySettings {
            max_retries: 1,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        },
        ..EventHubSinkConfig::default()
    };

    EventHubTransport {
        client: reqwest::Client::new(),
        messages_url: format!("{}/messages", config.endpoint),
        sas_token: config.sas_token.clone(),
        max_message_size: config.max_message_size,
        policy: RetryPolicy::from(config.retry),
    }
}

#[tokio::test]
async fn test_batch_below_limit_is_one_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("Authorization", "SharedAccessSignature sr=test"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let mut transport = transport(&server, 1_046_528);
    let batch: Vec<EventRecord> = (0..5).map(record).collect();

    transport.write_batch(batch).await.unwrap();
}

#[tokio::test]
async fn test_large_batch_splits_into_multiple_posts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let batch: Vec<EventRecord> = (0..10).map(record).collect();
    let one_size = serde_json::to_vec(&batch[0]).unwrap().len();

    let mut transport = transport(&server, one_size * 3 + 2);
    transport.write_batch(batch).await.unwrap();

    assert!(server.received_requests().await.unwrap().len() >= 3);
}

#[tokio::test]
async fn test_rejected_chunk_aborts_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let mut transport = transport(&server, 1_046_528);
    let batch: Vec<EventRecord> = (0..3).map(record).collect();

    let err = transport.write_batch(batch).await.unwrap_err();
    assert!(!err.is_transient());
}

// =============================================================================
// Helper functions
// =============================================================================

fn record(count: i32) -> EventRecord {
    EventRecord::new(sample_event(count), None)
}

fn sample_event(count: i32) -> Event {
    Event {
        involved_object: ObjectRef {
            kind: "Pod".into(),
            name: format!("pod-{count}"),
            namespace: "default".into(),
            uid: "uid".into(),
        },
        reason: "Started".into(),
        message: "Started container web".into(),
        event_type: EventType::Normal,
        source: EventSource::default(),
        first_seen: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
        last_seen: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
        count,
    }
}
