//! HTTP sink - coalesced framed lines per POST
//!
//! Sends records to an HTTP drain as framed messages, one per line:
//!
//! ```text
//! <byte count><SP><JSON payload>
//! ```
//!
//! Events that arrive faster than the drain accepts them coalesce into
//! one request; otherwise a single request is made per event. The body
//! buffer is reused across batches to avoid per-request allocations.
//!
//! Failed requests retry with exponential backoff and jitter, bounded by
//! the configured retry count. A 5xx or 429 response is transient; any
//! other non-2xx response is treated as the drain rejecting the payload
//! and is not retried.

use async_trait::async_trait;
use evr_config::HttpSinkConfig;
use evr_pipeline::{BatchTransport, DeliveryError};
use evr_protocol::{EventRecord, encode_framed_into};
use reqwest::StatusCode;

use crate::common::{RunningSink, SinkBuildError, spawn_buffered};
use crate::retry::{RetryPolicy, retry};

/// Build the HTTP sink and start its delivery worker
pub fn spawn(config: HttpSinkConfig) -> Result<RunningSink, SinkBuildError> {
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;

    let transport = HttpTransport {
        client,
        url: config.url.clone(),
        policy: config.retry.clone().into(),
        body: Vec::with_capacity(4096),
    };

    Ok(spawn_buffered("http", &config.queue, transport))
}

/// Transport performing one POST per coalesced batch
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    policy: RetryPolicy,

    /// Reused body buffer, truncated per batch
    body: Vec<u8>,
}

#[async_trait]
impl BatchTransport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn write_batch(&mut self, batch: Vec<EventRecord>) -> Result<(), DeliveryError> {
        self.body.clear();

        // Line-oriented format: a record that fails to serialize is
        // abandoned on its own, the rest of the batch still ships.
        let mut serialized = 0usize;
        for record in &batch {
            match encode_framed_into(record, &mut self.body) {
                Ok(_) => {
                    self.body.push(b'\n');
                    serialized += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unserializable record");
                }
            }
        }

        if serialized == 0 {
            return Ok(());
        }

        tracing::trace!(records = serialized, bytes = self.body.len(), "posting batch");

        let client = &self.client;
        let url = &self.url;
        let body = &self.body;

        retry(&self.policy, "http post", || {
            let client = client.clone();
            let url = url.clone();
            let body = body.clone();

            async move {
                let response = client
                    .post(url.as_str())
                    .body(body)
                    .send()
                    .await
                    .map_err(|e| {
                        DeliveryError::transient_from(format!("request to {url} failed"), e)
                    })?;

                classify_status(response.status(), &url)
            }
        })
        .await
    }
}

/// Map a response status to the delivery outcome
fn classify_status(status: StatusCode, url: &str) -> Result<(), DeliveryError> {
    if status.is_success() {
        Ok(())
    } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        Err(DeliveryError::transient(format!(
            "got HTTP {status} from {url}"
        )))
    } else {
        Err(DeliveryError::permanent(format!(
            "got HTTP {status} from {url}"
        )))
    }
}
