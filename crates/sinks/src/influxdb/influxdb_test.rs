//! Tests for the influxdb sink

use std::time::Duration;

use chrono::{TimeZone, Utc};
use evr_config::InfluxDbSinkConfig;
use evr_protocol::{Event, EventSource, EventType, ObjectRef};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::EventSink;
use crate::influxdb::InfluxDbSink;

fn config(host: String) -> InfluxDbSinkConfig {
    InfluxDbSinkConfig {
        host,
        username: "writer".into(),
        password: "secret".into(),
        database: "events".into(),
        request_timeout: Duration::from_secs(2),
        ..InfluxDbSinkConfig::default()
    }
}

fn sink_for(server: &MockServer) -> InfluxDbSink {
    // The mock server URI is http://host:port; the sink builds its own
    // scheme from `secure`, so hand it just the authority.
    let host = server.uri().trim_start_matches("http://").to_string();
    InfluxDbSink::new(config(host)).unwrap()
}

// =============================================================================
// Write path tests
// =============================================================================

#[tokio::test]
async fn test_creates_database_then_writes_point() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_string_contains("CREATE+DATABASE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/write"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let sink = sink_for(&server);
    sink.update_events(&sample_event(), None).await;
}

#[tokio::test]
async fn test_database_created_once_across_writes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/write"))
        .respond_with(ResponseTemplate::new(204))
        .expect(3)
        .mount(&server)
        .await;

    let sink = sink_for(&server);
    for _ in 0..3 {
        sink.update_events(&sample_event(), None).await;
    }
}

#[tokio::test]
async fn test_vanished_database_is_recreated_once() {
    let server = MockServer::start().await;

    // First write fails with "database not found"; the sink recreates
    // the database and retries the write exactly once.
    Mock::given(method("POST"))
        .and(path("/write"))
        .respond_with(
            ResponseTemplate::new(404).set_body_string("{\"error\":\"database not found\"}"),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/write"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let sink = sink_for(&server);
    sink.update_events(&sample_event(), None).await;

    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_point_carries_tags_and_value() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/write"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let sink = sink_for(&server);
    sink.update_events(&sample_event(), None).await;

    let requests = server.received_requests().await.unwrap();
    let write = requests
        .iter()
        .find(|r| r.url.path() == "/write")
        .expect("write request");

    let line = std::str::from_utf8(&write.body).unwrap();
    assert!(line.starts_with("cluster_events,"));
    assert!(line.contains("uid=uid-1"));
    assert!(line.contains("pod_name=web-1"));
    assert!(line.contains("hostname=node-a"));
    assert!(line.contains("cluster_name=default"));
    assert!(line.contains(" value=\""));
}

// =============================================================================
// Point rendering tests
// =============================================================================

#[tokio::test]
async fn test_with_fields_point_shape() {
    let server = MockServer::start().await;
    let host = server.uri().trim_start_matches("http://").to_string();

    let sink = InfluxDbSink::new(InfluxDbSinkConfig {
        with_fields: true,
        cluster_name: "prod".into(),
        ..config(host)
    })
    .unwrap();

    let line = sink.event_to_line(&sample_event()).unwrap();
    assert!(line.starts_with("events,"));
    assert!(line.contains("type=warning"));
    assert!(line.contains("kind=Pod"));
    assert!(line.contains("reason=BackOff"));
    assert!(line.contains("namespace_name=default"));
    assert!(line.contains("cluster_name=prod"));
    assert!(line.contains(" message=\""));
}

#[tokio::test]
async fn test_tag_escaping() {
    let server = MockServer::start().await;
    let host = server.uri().trim_start_matches("http://").to_string();
    let sink = InfluxDbSink::new(config(host)).unwrap();

    let mut event = sample_event();
    event.source.host = "node a,b=c".into();

    let line = sink.event_to_line(&event).unwrap();
    assert!(line.contains("hostname=node\\ a\\,b\\=c"));
}

// =============================================================================
// Helper functions
// =============================================================================

fn sample_event() -> Event {
    Event {
        involved_object: ObjectRef {
            kind: "Pod".into(),
            name: "web-1".into(),
            namespace: "default".into(),
            uid: "uid-1".into(),
        },
        reason: "BackOff".into(),
        message: "Back-off restarting failed container".into(),
        event_type: EventType::Warning,
        source: EventSource {
            component: "kubelet".into(),
            host: "node-a".into(),
        },
        first_seen: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
        last_seen: Utc.with_ymd_and_hms(2024, 3, 1, 10, 5, 0).unwrap(),
        count: 3,
    }
}
