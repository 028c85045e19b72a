//! Log sink - one structured log line per record
//!
//! The simplest destination: records go to the process's own log stream.
//! Useful when a log shipper already collects container output.

use async_trait::async_trait;
use evr_protocol::{Event, EventRecord};

use crate::common::EventSink;

/// Sink that emits each record as a log line
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    /// Create a new log sink
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn update_events(&self, new: &Event, old: Option<&Event>) {
        let record = EventRecord::new(new.clone(), old.cloned());

        match serde_json::to_string(&record) {
            Ok(json) => tracing::info!(target: "evr_sinks::log::events", "{json}"),
            Err(e) => tracing::warn!(error = %e, "failed to serialize event record"),
        }
    }
}
