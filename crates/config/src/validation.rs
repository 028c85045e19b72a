//! Configuration validation
//!
//! Runs at parse time, before any record is accepted. Only the selected
//! sink's section is validated; other sections may be present and
//! incomplete without consequence.

use crate::error::{ConfigError, Result};
use crate::sinks::SinkKind;
use crate::{Config, QueueSettings};

/// Validate the whole configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let kind = SinkKind::from_name(&config.sink)
        .ok_or_else(|| ConfigError::unknown_sink(&config.sink))?;

    match kind {
        SinkKind::Log | SinkKind::Stdout => Ok(()),
        SinkKind::Http => validate_http(config),
        SinkKind::Syslog => validate_syslog(config),
        SinkKind::Kafka => validate_kafka(config),
        SinkKind::S3 => validate_s3(config),
        SinkKind::InfluxDb => validate_influxdb(config),
        SinkKind::Elasticsearch => validate_elasticsearch(config),
        SinkKind::EventHub => validate_eventhub(config),
    }
}

fn validate_http(config: &Config) -> Result<()> {
    let http = config
        .http
        .as_ref()
        .ok_or_else(|| ConfigError::missing_section("http"))?;

    require("http", "url", &http.url)?;
    require_http_url("http", "url", &http.url)?;
    validate_queue("http", &http.queue)
}

fn validate_syslog(config: &Config) -> Result<()> {
    let syslog = config
        .syslog
        .as_ref()
        .ok_or_else(|| ConfigError::missing_section("syslog"))?;

    require("syslog", "endpoint", &syslog.endpoint)?;
    if syslog.port == 0 {
        return Err(ConfigError::invalid_value(
            "syslog",
            "port",
            "must be a non-zero TCP port",
        ));
    }
    validate_queue("syslog", &syslog.queue)
}

fn validate_kafka(config: &Config) -> Result<()> {
    let kafka = config
        .kafka
        .as_ref()
        .ok_or_else(|| ConfigError::missing_section("kafka"))?;

    if kafka.brokers.is_empty() {
        return Err(ConfigError::missing_field("kafka", "brokers"));
    }
    if kafka.brokers.iter().any(|b| b.is_empty()) {
        return Err(ConfigError::invalid_value(
            "kafka",
            "brokers",
            "broker addresses must be non-empty",
        ));
    }
    require("kafka", "topic", &kafka.topic)?;

    // SASL is all-or-nothing
    if kafka.sasl_user.is_some() != kafka.sasl_password.is_some() {
        return Err(ConfigError::invalid_value(
            "kafka",
            "sasl_user",
            "sasl_user and sasl_password must be set together",
        ));
    }

    Ok(())
}

fn validate_s3(config: &Config) -> Result<()> {
    let s3 = config
        .s3
        .as_ref()
        .ok_or_else(|| ConfigError::missing_section("s3"))?;

    require("s3", "access_key_id", &s3.access_key_id)?;
    require("s3", "secret_access_key", &s3.secret_access_key)?;
    require("s3", "region", &s3.region)?;
    require("s3", "bucket", &s3.bucket)?;
    require("s3", "prefix", &s3.prefix)?;

    if s3.upload_interval.is_zero() {
        return Err(ConfigError::invalid_value(
            "s3",
            "upload_interval",
            "must be positive",
        ));
    }
    validate_queue("s3", &s3.queue)
}

fn validate_influxdb(config: &Config) -> Result<()> {
    let influx = config
        .influxdb
        .as_ref()
        .ok_or_else(|| ConfigError::missing_section("influxdb"))?;

    require("influxdb", "host", &influx.host)?;
    require("influxdb", "username", &influx.username)?;
    require("influxdb", "password", &influx.password)?;
    require("influxdb", "database", &influx.database)
}

fn validate_elasticsearch(config: &Config) -> Result<()> {
    let es = config
        .elasticsearch
        .as_ref()
        .ok_or_else(|| ConfigError::missing_section("elasticsearch"))?;

    require("elasticsearch", "url", &es.url)?;
    require_http_url("elasticsearch", "url", &es.url)?;
    require("elasticsearch", "index", &es.index)
}

fn validate_eventhub(config: &Config) -> Result<()> {
    let hub = config
        .eventhub
        .as_ref()
        .ok_or_else(|| ConfigError::missing_section("eventhub"))?;

    require("eventhub", "endpoint", &hub.endpoint)?;
    require_http_url("eventhub", "endpoint", &hub.endpoint)?;
    require("eventhub", "sas_token", &hub.sas_token)?;

    if hub.max_message_size == 0 {
        return Err(ConfigError::invalid_value(
            "eventhub",
            "max_message_size",
            "must be positive",
        ));
    }
    validate_queue("eventhub", &hub.queue)
}

fn require(sink: &'static str, field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ConfigError::missing_field(sink, field));
    }
    Ok(())
}

fn require_http_url(sink: &'static str, field: &'static str, value: &str) -> Result<()> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(ConfigError::invalid_value(
            sink,
            field,
            "must start with http:// or https://",
        ));
    }
    Ok(())
}

fn validate_queue(sink: &'static str, queue: &QueueSettings) -> Result<()> {
    if queue.buffer_size == 0 {
        return Err(ConfigError::invalid_value(
            sink,
            "buffer_size",
            "must be positive",
        ));
    }
    Ok(())
}
