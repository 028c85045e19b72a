//! Kafka sink - one message per record
//!
//! Produces each record as one JSON message, keyed by the involved
//! object's name so updates to the same resource land on the same
//! partition. The client library owns buffering and send retries
//! (`message.send.max.retries`), so this sink writes directly from the
//! admission path with no queue of its own.
//!
//! The producer flavor is a tagged variant chosen once at construction:
//! either wait for broker acknowledgement per message, or enqueue
//! locally and let delivery complete in the background.

use async_trait::async_trait;
use evr_config::{KafkaSinkConfig, SaslMechanism};
use evr_protocol::{Event, EventRecord};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{BaseProducer, BaseRecord, FutureProducer, FutureRecord};
use rdkafka::util::Timeout;

use crate::common::{EventSink, SinkBuildError};

/// The two producer flavors, selected at construction
enum KafkaProducer {
    /// Waits for broker acknowledgement per message
    Sync(FutureProducer),

    /// Enqueues locally; delivery completes in the background
    Async(BaseProducer),
}

/// Sink producing one message per record to a Kafka topic
pub struct KafkaSink {
    topic: String,
    producer: KafkaProducer,
}

impl KafkaSink {
    /// Create a producer from validated configuration
    pub fn new(config: &KafkaSinkConfig) -> Result<Self, SinkBuildError> {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", config.brokers.join(","))
            .set("request.required.acks", "all")
            .set("message.send.max.retries", config.retry_max.to_string())
            .set(
                "message.timeout.ms",
                config.message_timeout.as_millis().to_string(),
            );

        if let (Some(user), Some(password)) = (&config.sasl_user, &config.sasl_password) {
            let mechanism = config.sasl_mechanism.unwrap_or(SaslMechanism::Plain);
            client_config
                .set("security.protocol", "sasl_plaintext")
                .set("sasl.mechanism", mechanism.as_str())
                .set("sasl.username", user)
                .set("sasl.password", password);
        }

        let producer = if config.r#async {
            KafkaProducer::Async(client_config.create()?)
        } else {
            KafkaProducer::Sync(client_config.create()?)
        };

        Ok(Self {
            topic: config.topic.clone(),
            producer,
        })
    }

    /// Whether this sink waits for broker acknowledgement per message
    pub fn is_sync(&self) -> bool {
        matches!(self.producer, KafkaProducer::Sync(_))
    }
}

#[async_trait]
impl EventSink for KafkaSink {
    fn name(&self) -> &'static str {
        "kafka"
    }

    async fn update_events(&self, new: &Event, old: Option<&Event>) {
        let record = EventRecord::new(new.clone(), old.cloned());

        let payload = match serde_json::to_vec(&record) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize event record");
                return;
            }
        };
        let key = new.involved_object.name.as_str();

        match &self.producer {
            KafkaProducer::Sync(producer) => {
                let message = FutureRecord::to(&self.topic).key(key).payload(&payload);
                match producer.send(message, Timeout::Never).await {
                    Ok((partition, offset)) => tracing::trace!(
                        topic = %self.topic,
                        partition,
                        offset,
                        "produced event message"
                    ),
                    Err((e, _)) => tracing::error!(
                        topic = %self.topic,
                        error = %e,
                        "failed to produce event message"
                    ),
                }
            }
            KafkaProducer::Async(producer) => {
                let message = BaseRecord::to(&self.topic).key(key).payload(&payload);
                if let Err((e, _)) = producer.send(message) {
                    tracing::error!(
                        topic = %self.topic,
                        error = %e,
                        "failed to enqueue event message"
                    );
                }
                // Serve delivery callbacks opportunistically
                producer.poll(Timeout::After(std::time::Duration::ZERO));
            }
        }
    }
}

#[cfg(test)]
#[path = "kafka_test.rs"]
mod kafka_test;
