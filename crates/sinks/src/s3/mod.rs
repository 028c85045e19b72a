//! S3 sink - time-windowed object uploads
//!
//! Renders coalesced batches into a pending buffer and uploads the buffer
//! as one object, at most once per `upload_interval`. Batches arriving
//! inside the window accumulate silently and ride along with the next
//! upload; object keys are laid out by date so downstream loaders can
//! partition on the prefix:
//!
//! ```text
//! {prefix}/{year}/{month}/{day}/{nanos}.txt
//! ```
//!
//! Two content formats are supported: framed lines (the same messages
//! the HTTP sink sends) and flattened single-level JSON for warehouse
//! ingestion.
//!
//! The physical write sits behind [`ObjectUploader`] so the windowing
//! behavior is testable without credentials.

use std::time::Instant;

use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Datelike, Utc};
use evr_config::{S3OutputFormat, S3SinkConfig};
use evr_pipeline::{BatchTransport, DeliveryError};
use evr_protocol::{EventRecord, FLATTEN_DELIMITER, encode_flattened, encode_framed_into};

use crate::common::{RunningSink, spawn_buffered};

/// Build the S3 sink and start its delivery worker
pub async fn spawn(config: S3SinkConfig) -> RunningSink {
    let uploader = AwsUploader::new(&config).await;

    let transport = S3Transport {
        uploader,
        prefix: config.prefix.clone(),
        format: config.format,
        upload_interval: config.upload_interval,
        last_upload: None,
        pending: Vec::with_capacity(4096),
    };

    spawn_buffered("s3", &config.queue, transport)
}

/// The physical object write
#[async_trait]
pub trait ObjectUploader: Send + Sync {
    /// Store `body` under `key`
    async fn upload(&self, key: &str, body: Vec<u8>) -> Result<(), DeliveryError>;
}

/// Production uploader backed by the AWS SDK
pub struct AwsUploader {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl AwsUploader {
    /// Build a client from static credentials
    pub async fn new(config: &S3SinkConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "sink-config",
        );

        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        Self {
            client: aws_sdk_s3::Client::new(&shared),
            bucket: config.bucket.clone(),
        }
    }
}

#[async_trait]
impl ObjectUploader for AwsUploader {
    async fn upload(&self, key: &str, body: Vec<u8>) -> Result<(), DeliveryError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                DeliveryError::transient_from(format!("upload of '{key}' failed"), e)
            })?;

        Ok(())
    }
}

/// Transport gating physical writes on the upload interval
pub struct S3Transport<U> {
    uploader: U,
    prefix: String,
    format: S3OutputFormat,

    /// Minimum time between physical writes
    upload_interval: std::time::Duration,

    /// When the last successful upload happened; `None` before the first
    last_upload: Option<Instant>,

    /// Rendered records carried forward until the window opens
    pending: Vec<u8>,
}

impl<U: ObjectUploader> S3Transport<U> {
    fn window_open(&self) -> bool {
        match self.last_upload {
            None => true,
            Some(at) => at.elapsed() >= self.upload_interval,
        }
    }

    fn object_key(&self, now: DateTime<Utc>) -> String {
        format!(
            "{}/{}/{:02}/{:02}/{}.txt",
            self.prefix,
            now.year(),
            now.month(),
            now.day(),
            now.timestamp_nanos_opt().unwrap_or_default()
        )
    }

    fn render_into_pending(&mut self, batch: &[EventRecord]) {
        for record in batch {
            let rendered = match self.format {
                S3OutputFormat::Framed => {
                    encode_framed_into(record, &mut self.pending).map(|_| ())
                }
                S3OutputFormat::FlatJson => encode_flattened(record, FLATTEN_DELIMITER)
                    .map(|bytes| self.pending.extend_from_slice(&bytes)),
            };

            match rendered {
                Ok(()) => self.pending.push(b'\n'),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unserializable record");
                }
            }
        }
    }

    async fn upload_pending(&mut self) -> Result<(), DeliveryError> {
        let key = self.object_key(Utc::now());
        let body = std::mem::take(&mut self.pending);
        let bytes = body.len();

        self.uploader.upload(&key, body).await?;

        self.last_upload = Some(Instant::now());
        tracing::info!(key = %key, bytes, "uploaded events object");
        Ok(())
    }
}

#[async_trait]
impl<U: ObjectUploader> BatchTransport for S3Transport<U> {
    fn name(&self) -> &str {
        "s3"
    }

    async fn write_batch(&mut self, batch: Vec<EventRecord>) -> Result<(), DeliveryError> {
        self.render_into_pending(&batch);

        // Inside the window: accumulate silently, carry the buffer into
        // the next batch.
        if !self.window_open() {
            tracing::trace!(
                pending_bytes = self.pending.len(),
                "inside upload window, buffering"
            );
            return Ok(());
        }

        if self.pending.is_empty() {
            return Ok(());
        }

        self.upload_pending().await
    }
}
