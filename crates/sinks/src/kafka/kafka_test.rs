//! Tests for the kafka sink

use evr_config::{KafkaSinkConfig, SaslMechanism};

use crate::common::EventSink;
use crate::kafka::KafkaSink;

fn base_config() -> KafkaSinkConfig {
    KafkaSinkConfig {
        brokers: vec!["127.0.0.1:9092".into()],
        ..KafkaSinkConfig::default()
    }
}

// =============================================================================
// Construction tests
// =============================================================================

#[test]
fn test_async_config_builds_background_producer() {
    let sink = KafkaSink::new(&base_config()).unwrap();

    assert!(!sink.is_sync());
    assert_eq!(sink.name(), "kafka");
}

#[test]
fn test_sync_config_builds_acknowledged_producer() {
    let config = KafkaSinkConfig {
        r#async: false,
        ..base_config()
    };

    let sink = KafkaSink::new(&config).unwrap();
    assert!(sink.is_sync());
}

#[test]
fn test_sasl_config_builds() {
    // Producer creation validates the config shape; no broker contact yet
    let config = KafkaSinkConfig {
        sasl_user: Some("svc".into()),
        sasl_password: Some("secret".into()),
        sasl_mechanism: Some(SaslMechanism::ScramSha256),
        ..base_config()
    };

    assert!(KafkaSink::new(&config).is_ok());
}

#[test]
fn test_multiple_brokers_join() {
    let config = KafkaSinkConfig {
        brokers: vec!["kafka-0:9092".into(), "kafka-1:9092".into()],
        ..KafkaSinkConfig::default()
    };

    assert!(KafkaSink::new(&config).is_ok());
}
