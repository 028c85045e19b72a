//! Stdout sink - one JSON line per record
//!
//! Logging raw JSON to stdout gets automated indexing from collectors
//! that tail container output, without any drain configuration. The
//! optional `wrap_key` nests each record under a fixed envelope key for
//! indexers that expect one.

use async_trait::async_trait;
use evr_config::StdoutSinkConfig;
use evr_protocol::{Event, EventRecord};

use crate::common::EventSink;

/// Sink that prints each record to stdout
#[derive(Debug)]
pub struct StdoutSink {
    config: StdoutSinkConfig,
}

impl StdoutSink {
    /// Create a new stdout sink
    pub fn new(config: StdoutSinkConfig) -> Self {
        Self { config }
    }

    fn render(&self, record: &EventRecord) -> Result<String, serde_json::Error> {
        match &self.config.wrap_key {
            Some(key) => {
                let mut wrapped = serde_json::Map::with_capacity(1);
                wrapped.insert(key.clone(), serde_json::to_value(record)?);
                serde_json::to_string(&wrapped)
            }
            None => serde_json::to_string(record),
        }
    }
}

#[async_trait]
impl EventSink for StdoutSink {
    fn name(&self) -> &'static str {
        "stdout"
    }

    async fn update_events(&self, new: &Event, old: Option<&Event>) {
        let record = EventRecord::new(new.clone(), old.cloned());

        match self.render(&record) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::warn!(error = %e, "failed to serialize event record"),
        }
    }
}
