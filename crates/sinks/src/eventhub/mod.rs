//! Event hub sink - size-bounded chunks per batch
//!
//! Serializes each record to JSON and packs consecutive records into
//! chunks no larger than `max_message_size`; when adding the next record
//! would overflow the chunk, the accumulated chunk is sent and a new one
//! started, and the remainder always flushes at the end of the batch.
//! Each chunk is one POST to the hub's `/messages` endpoint, authorized
//! with a pre-issued shared access signature.

use async_trait::async_trait;
use evr_config::EventHubSinkConfig;
use evr_pipeline::{BatchTransport, DeliveryError};
use evr_protocol::EventRecord;
use reqwest::StatusCode;

use crate::common::{RunningSink, SinkBuildError, spawn_buffered};
use crate::retry::{RetryPolicy, retry};

/// Build the event hub sink and start its delivery worker
pub fn spawn(config: EventHubSinkConfig) -> Result<RunningSink, SinkBuildError> {
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;

    let transport = EventHubTransport {
        client,
        messages_url: format!("{}/messages", config.endpoint.trim_end_matches('/')),
        sas_token: config.sas_token.clone(),
        max_message_size: config.max_message_size,
        policy: config.retry.clone().into(),
    };

    Ok(spawn_buffered("eventhub", &config.queue, transport))
}

/// Transport posting size-bounded chunks
pub struct EventHubTransport {
    client: reqwest::Client,
    messages_url: String,
    sas_token: String,
    max_message_size: usize,
    policy: RetryPolicy,
}

#[async_trait]
impl BatchTransport for EventHubTransport {
    fn name(&self) -> &str {
        "eventhub"
    }

    async fn write_batch(&mut self, batch: Vec<EventRecord>) -> Result<(), DeliveryError> {
        let chunks = pack_chunks(&batch, self.max_message_size);

        for chunk in chunks {
            self.send_chunk(chunk).await?;
        }

        Ok(())
    }
}

impl EventHubTransport {
    async fn send_chunk(&self, chunk: Vec<u8>) -> Result<(), DeliveryError> {
        let bytes = chunk.len();
        tracing::trace!(bytes, "sending event hub chunk");

        retry(&self.policy, "eventhub send", || {
            let request = self
                .client
                .post(self.messages_url.as_str())
                .header("Authorization", self.sas_token.as_str())
                .header("Content-Type", "application/json")
                .body(chunk.clone());
            let url = &self.messages_url;

            async move {
                let response = request.send().await.map_err(|e| {
                    DeliveryError::transient_from(format!("request to {url} failed"), e)
                })?;

                let status = response.status();
                if status.is_success() {
                    Ok(())
                } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                    Err(DeliveryError::transient(format!(
                        "hub returned {status}"
                    )))
                } else {
                    Err(DeliveryError::permanent(format!(
                        "hub rejected chunk with {status}"
                    )))
                }
            }
        })
        .await
    }
}

/// Pack serialized records into chunks of at most `max_size` bytes
///
/// Records are newline-separated within a chunk. A record that fails to
/// serialize is skipped; a single record larger than `max_size` cannot be
/// split and becomes its own oversized chunk.
pub(crate) fn pack_chunks(records: &[EventRecord], max_size: usize) -> Vec<Vec<u8>> {
    let mut chunks = Vec::new();
    let mut current: Vec<u8> = Vec::new();

    for record in records {
        let payload = match serde_json::to_vec(record) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unserializable record");
                continue;
            }
        };

        // +1 for the newline separator when the chunk is non-empty
        let needed = payload.len() + usize::from(!current.is_empty());
        if !current.is_empty() && current.len() + needed > max_size {
            chunks.push(std::mem::take(&mut current));
        }

        if !current.is_empty() {
            current.push(b'\n');
        }
        current.extend_from_slice(&payload);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
#[path = "eventhub_test.rs"]
mod eventhub_test;
