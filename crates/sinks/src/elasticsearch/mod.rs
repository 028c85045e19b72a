//! Elasticsearch sink - one document per record
//!
//! Adds each observed record as a document to a configured index over the
//! HTTP API. Authentication is an API key when configured, otherwise
//! basic auth; the API key wins when both are present.
//!
//! The index write is idempotent from the destination's point of view, so
//! transient failures (connection errors, 5xx, 429) retry with the shared
//! backoff policy; any other 4xx means the cluster rejected the document
//! and is not retried.

use async_trait::async_trait;
use evr_config::ElasticsearchSinkConfig;
use evr_pipeline::DeliveryError;
use evr_protocol::{Event, EventRecord};
use reqwest::StatusCode;

use crate::common::{EventSink, SinkBuildError};
use crate::retry::{RetryPolicy, retry};

/// Sink adding one document per record to an index
pub struct ElasticsearchSink {
    config: ElasticsearchSinkConfig,
    client: reqwest::Client,
    doc_url: String,
    policy: RetryPolicy,
}

impl ElasticsearchSink {
    /// Create a sink from validated configuration
    pub fn new(config: ElasticsearchSinkConfig) -> Result<Self, SinkBuildError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let doc_url = format!(
            "{}/{}/_doc",
            config.url.trim_end_matches('/'),
            config.index
        );
        let policy = config.retry.clone().into();

        Ok(Self {
            config,
            client,
            doc_url,
            policy,
        })
    }

    /// Apply the configured authentication to a request
    ///
    /// API key takes precedence over basic auth.
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(api_key) = &self.config.api_key {
            request.header("Authorization", format!("ApiKey {api_key}"))
        } else if let Some(username) = &self.config.username {
            request.basic_auth(username, self.config.password.as_ref())
        } else {
            request
        }
    }

    async fn index_document(&self, payload: &[u8]) -> Result<(), DeliveryError> {
        retry(&self.policy, "elasticsearch index", || {
            let request = self.authorize(
                self.client
                    .post(self.doc_url.as_str())
                    .header("Content-Type", "application/json")
                    .body(payload.to_vec()),
            );
            let url = &self.doc_url;

            async move {
                let response = request.send().await.map_err(|e| {
                    DeliveryError::transient_from(format!("request to {url} failed"), e)
                })?;

                let status = response.status();
                if status.is_success() {
                    Ok(())
                } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                    Err(DeliveryError::transient(format!(
                        "index write returned {status}"
                    )))
                } else {
                    let body = response.text().await.unwrap_or_default();
                    Err(DeliveryError::permanent(format!(
                        "index write rejected with {status}: {body}"
                    )))
                }
            }
        })
        .await
    }
}

#[async_trait]
impl EventSink for ElasticsearchSink {
    fn name(&self) -> &'static str {
        "elasticsearch"
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

        if let Err(e) = self.index_document(&payload).await {
            tracing::error!(index = %self.config.index, error = %e, "document add failed");
        }
    }
}

#[cfg(test)]
#[path = "elasticsearch_test.rs"]
mod elasticsearch_test;
