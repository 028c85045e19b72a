//! Common sink surface
//!
//! `EventSink` is the admission-side entry point every destination
//! implements; `build_sink` constructs the single active destination from
//! validated configuration and returns a `RunningSink` handle that owns
//! its background delivery worker, if it has one.

use std::sync::Arc;

use async_trait::async_trait;
use evr_config::{Config, QueueSettings, SinkKind};
use evr_pipeline::{BatchTransport, DrainLoop, DrainStats, QueueSender, queue};
use evr_protocol::{Event, EventRecord};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::elasticsearch::ElasticsearchSink;
use crate::eventhub;
use crate::http;
use crate::influxdb::InfluxDbSink;
use crate::kafka::KafkaSink;
use crate::log::LogSink;
use crate::s3;
use crate::stdout::StdoutSink;
use crate::syslog;

/// Admission-side entry point of a destination
///
/// `update_events` never reports an error to the caller: admission-time
/// failures are logged and the record is abandoned, so a misbehaving
/// destination cannot crash the watch path.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Short destination name, used in log lines
    fn name(&self) -> &'static str;

    /// Accept one observed change: the event as observed, and the
    /// previous version when this is an update
    async fn update_events(&self, new: &Event, old: Option<&Event>);
}

/// Errors constructing a destination at startup
#[derive(Debug, Error)]
pub enum SinkBuildError {
    /// The sink name does not belong to the closed destination set
    #[error("unknown sink '{0}'")]
    UnknownSink(String),

    /// The selected sink has no configuration section
    ///
    /// Validated configs cannot reach this; it guards direct callers.
    #[error("sink '{0}' is selected but not configured")]
    NotConfigured(&'static str),

    /// Building the HTTP client failed
    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Creating the Kafka producer failed
    #[error("failed to create kafka producer: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
}

/// The active destination plus its background delivery worker
pub struct RunningSink {
    sink: Arc<dyn EventSink>,
    stop: CancellationToken,
    worker: Option<JoinHandle<DrainStats>>,
}

impl std::fmt::Debug for RunningSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningSink")
            .field("has_worker", &self.worker.is_some())
            .finish()
    }
}

impl RunningSink {
    /// Wrap a sink that writes directly from the admission path
    pub fn direct(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink,
            stop: CancellationToken::new(),
            worker: None,
        }
    }

    /// The admission-side handle
    pub fn sink(&self) -> Arc<dyn EventSink> {
        Arc::clone(&self.sink)
    }

    /// Signal stop and wait for the delivery worker to finish
    ///
    /// A delivery in flight completes before the worker exits. Direct
    /// sinks return immediately.
    pub async fn shutdown(mut self) {
        self.stop.cancel();

        if let Some(worker) = self.worker.take() {
            match worker.await {
                Ok(stats) => tracing::info!(
                    sink = %self.sink.name(),
                    batches_delivered = stats.batches_delivered,
                    batches_failed = stats.batches_failed,
                    "sink worker finished"
                ),
                Err(e) => tracing::error!(
                    sink = %self.sink.name(),
                    error = %e,
                    "sink worker panicked"
                ),
            }
        }
    }
}

/// A sink whose admission side is a queue push
///
/// The paired drain loop owns the transport; this side only constructs
/// the immutable record and hands it over.
struct QueueSink {
    name: &'static str,
    sender: QueueSender,
}

#[async_trait]
impl EventSink for QueueSink {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn update_events(&self, new: &Event, old: Option<&Event>) {
        let record = EventRecord::new(new.clone(), old.cloned());

        if self.sender.push(record).await.is_err() {
            tracing::warn!(sink = %self.name, "record dropped: delivery worker is gone");
        }
    }
}

/// Wire a queue-backed sink: queue, drain loop task, admission handle
pub(crate) fn spawn_buffered<T>(
    name: &'static str,
    settings: &QueueSettings,
    transport: T,
) -> RunningSink
where
    T: BatchTransport + 'static,
{
    let (sender, receiver) = queue(settings.buffer_size, settings.overflow);
    let stop = CancellationToken::new();
    let worker = tokio::spawn(DrainLoop::new(receiver, transport).run(stop.clone()));

    RunningSink {
        sink: Arc::new(QueueSink { name, sender }),
        stop,
        worker: Some(worker),
    }
}

/// Construct the single active destination from validated configuration
///
/// Fails fast: every error here is a startup error, before any record is
/// accepted.
pub async fn build_sink(config: &Config) -> Result<RunningSink, SinkBuildError> {
    let kind = config
        .sink_kind()
        .ok_or_else(|| SinkBuildError::UnknownSink(config.sink.clone()))?;

    tracing::info!(sink = %kind.name(), "building sink");

    match kind {
        SinkKind::Log => Ok(RunningSink::direct(Arc::new(LogSink::new()))),
        SinkKind::Stdout => Ok(RunningSink::direct(Arc::new(StdoutSink::new(
            config.stdout.clone(),
        )))),
        SinkKind::Http => {
            let c = config
                .http
                .clone()
                .ok_or(SinkBuildError::NotConfigured("http"))?;
            http::spawn(c)
        }
        SinkKind::Syslog => {
            let c = config
                .syslog
                .clone()
                .ok_or(SinkBuildError::NotConfigured("syslog"))?;
            Ok(syslog::spawn(c))
        }
        SinkKind::Kafka => {
            let c = config
                .kafka
                .clone()
                .ok_or(SinkBuildError::NotConfigured("kafka"))?;
            Ok(RunningSink::direct(Arc::new(KafkaSink::new(&c)?)))
        }
        SinkKind::S3 => {
            let c = config
                .s3
                .clone()
                .ok_or(SinkBuildError::NotConfigured("s3"))?;
            Ok(s3::spawn(c).await)
        }
        SinkKind::InfluxDb => {
            let c = config
                .influxdb
                .clone()
                .ok_or(SinkBuildError::NotConfigured("influxdb"))?;
            Ok(RunningSink::direct(Arc::new(InfluxDbSink::new(c)?)))
        }
        SinkKind::Elasticsearch => {
            let c = config
                .elasticsearch
                .clone()
                .ok_or(SinkBuildError::NotConfigured("elasticsearch"))?;
            Ok(RunningSink::direct(Arc::new(ElasticsearchSink::new(c)?)))
        }
        SinkKind::EventHub => {
            let c = config
                .eventhub
                .clone()
                .ok_or(SinkBuildError::NotConfigured("eventhub"))?;
            eventhub::spawn(c)
        }
    }
}
