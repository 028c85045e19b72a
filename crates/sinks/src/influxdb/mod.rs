//! InfluxDB sink - one point per record
//!
//! Writes each observed event as a line-protocol point over the HTTP
//! `/write` API. The target database is created on demand, and a write
//! that fails because the database disappeared recreates it and retries
//! the write once before giving up.
//!
//! Connection state lives behind a mutex so a lazily-recreated database
//! is never observed half-initialized, even though the default
//! single-consumer design makes the lock uncontended.
//!
//! Two point shapes are supported:
//! - default: measurement `cluster_events`, the whole serialized event as
//!   one `value` field, identity tags only
//! - `with_fields`: measurement `events`, the message as a field and the
//!   event's identity spread across tags

use async_trait::async_trait;
use evr_config::InfluxDbSinkConfig;
use evr_pipeline::DeliveryError;
use evr_protocol::Event;
use tokio::sync::Mutex;

use crate::common::{EventSink, SinkBuildError};

const DB_NOT_FOUND: &str = "database not found";

/// Sink writing one point per record to InfluxDB
pub struct InfluxDbSink {
    config: InfluxDbSinkConfig,
    client: reqwest::Client,
    base_url: String,

    /// Guards database creation; one writer at a time
    state: Mutex<ConnectionState>,
}

#[derive(Debug, Default)]
struct ConnectionState {
    database_ready: bool,
}

impl InfluxDbSink {
    /// Create a sink from validated configuration
    pub fn new(config: InfluxDbSinkConfig) -> Result<Self, SinkBuildError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .build()?;

        let scheme = if config.secure { "https" } else { "http" };
        let base_url = format!("{scheme}://{}", config.host);

        Ok(Self {
            config,
            client,
            base_url,
            state: Mutex::new(ConnectionState::default()),
        })
    }

    /// Write one point, recreating the database once if it vanished
    async fn write_point(
        &self,
        state: &mut ConnectionState,
        line: &str,
    ) -> Result<(), DeliveryError> {
        self.ensure_database(state).await?;

        match self.post_write(line).await {
            Ok(()) => Ok(()),
            Err(e) if error_mentions(&e, DB_NOT_FOUND) => {
                tracing::warn!(database = %self.config.database, "database vanished, recreating");
                state.database_ready = false;
                self.ensure_database(state).await?;
                self.post_write(line).await
            }
            Err(e) => Err(e),
        }
    }

    async fn ensure_database(&self, state: &mut ConnectionState) -> Result<(), DeliveryError> {
        if state.database_ready {
            return Ok(());
        }

        let query = format!("CREATE DATABASE \"{}\"", self.config.database);
        let response = self
            .client
            .post(format!("{}/query", self.base_url))
            .basic_auth(&self.config.username, Some(&self.config.password))
            .form(&[("q", query.as_str())])
            .send()
            .await
            .map_err(|e| {
                DeliveryError::transient_from(
                    format!("database creation request to {} failed", self.base_url),
                    e,
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::transient(format!(
                "database creation returned {status}: {body}"
            )));
        }

        state.database_ready = true;
        tracing::info!(
            database = %self.config.database,
            host = %self.config.host,
            "created database"
        );
        Ok(())
    }

    async fn post_write(&self, line: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(format!("{}/write", self.base_url))
            .query(&[("db", self.config.database.as_str())])
            .basic_auth(&self.config.username, Some(&self.config.password))
            .body(line.to_string())
            .send()
            .await
            .map_err(|e| {
                DeliveryError::transient_from(
                    format!("write request to {} failed", self.base_url),
                    e,
                )
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() && !body.contains(DB_NOT_FOUND) {
            Err(DeliveryError::permanent(format!(
                "write rejected with {status}: {body}"
            )))
        } else {
            Err(DeliveryError::transient(format!(
                "write failed with {status}: {body}"
            )))
        }
    }

    /// Render an event as one line-protocol point
    fn event_to_line(&self, event: &Event) -> Result<String, serde_json::Error> {
        let mut line = String::with_capacity(256);

        if self.config.with_fields {
            line.push_str("events");
            push_tag(&mut line, "uid", &event.involved_object.uid);
            if event.involved_object.kind == "Pod" {
                push_tag(&mut line, "pod_id", &event.involved_object.uid);
            }
            push_tag(&mut line, "object_name", &event.involved_object.name);
            push_tag(&mut line, "type", event.event_type.as_str());
            push_tag(&mut line, "kind", &event.involved_object.kind);
            push_tag(&mut line, "component", &event.source.component);
            push_tag(&mut line, "reason", &event.reason);
            push_tag(&mut line, "namespace_name", &event.involved_object.namespace);
            push_tag(&mut line, "hostname", &event.source.host);
            push_tag(&mut line, "cluster_name", &self.config.cluster_name);

            line.push_str(" message=");
            push_field_string(&mut line, &event.message);
        } else {
            line.push_str("cluster_events");
            push_tag(&mut line, "uid", &event.involved_object.uid);
            if event.involved_object.kind == "Pod" {
                push_tag(&mut line, "pod_id", &event.involved_object.uid);
                push_tag(&mut line, "pod_name", &event.involved_object.name);
            }
            push_tag(&mut line, "hostname", &event.source.host);
            push_tag(&mut line, "cluster_name", &self.config.cluster_name);

            let value = serde_json::to_string(event)?;
            line.push_str(" value=");
            push_field_string(&mut line, &value);
        }

        line.push(' ');
        line.push_str(
            &event
                .last_seen
                .timestamp_nanos_opt()
                .unwrap_or_default()
                .to_string(),
        );

        Ok(line)
    }
}

#[async_trait]
impl EventSink for InfluxDbSink {
    fn name(&self) -> &'static str {
        "influxdb"
    }

    async fn update_events(&self, new: &Event, _old: Option<&Event>) {
        let line = match self.event_to_line(new) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "failed to convert event to point");
                return;
            }
        };

        let mut state = self.state.lock().await;
        if let Err(e) = self.write_point(&mut state, &line).await {
            tracing::error!(error = %e, "influxdb write failed");
        }
    }
}

/// Append `,key=value` with line-protocol tag escaping; empty values are
/// dropped (the protocol rejects them)
fn push_tag(line: &mut String, key: &str, value: &str) {
    if value.is_empty() {
        return;
    }

    line.push(',');
    line.push_str(key);
    line.push('=');
    for c in value.chars() {
        if matches!(c, ',' | '=' | ' ') {
            line.push('\\');
        }
        line.push(c);
    }
}

/// Append a quoted field string with escaping
fn push_field_string(line: &mut String, value: &str) {
    line.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            line.push('\\');
        }
        line.push(c);
    }
    line.push('"');
}

fn error_mentions(error: &DeliveryError, needle: &str) -> bool {
    error.to_string().contains(needle)
}

#[cfg(test)]
#[path = "influxdb_test.rs"]
mod influxdb_test;
