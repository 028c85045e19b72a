//! evrouter configuration
//!
//! TOML-based configuration with sensible defaults. One configuration key,
//! `sink`, selects the single active destination for the process lifetime;
//! each destination has its own section which is validated at load time,
//! before any record is accepted. Startup is the only place a bad setting
//! is allowed to abort the process.
//!
//! # Parsing
//!
//! ```
//! use std::str::FromStr;
//! use evr_config::Config;
//!
//! let config = Config::from_str("sink = \"stdout\"").unwrap();
//! assert_eq!(config.sink, "stdout");
//! ```
//!
//! # Example
//!
//! ```toml
//! sink = "http"
//!
//! [filter]
//! namespaces = ["kube-system"]
//!
//! [http]
//! url = "https://drain.example.com/events"
//! buffer_size = 1500
//! overflow = "drop_newest"
//! ```

mod error;
mod logging;
mod metrics;
mod sinks;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

pub use error::{ConfigError, Result};
pub use evr_filter::EventFilter;
pub use logging::{LogConfig, LogLevel};
pub use metrics::MetricsConfig;
pub use sinks::{
    ElasticsearchSinkConfig, EventHubSinkConfig, HttpSinkConfig, InfluxDbSinkConfig,
    KafkaSinkConfig, QueueSettings, RetrySettings, S3OutputFormat, S3SinkConfig, SaslMechanism,
    SinkKind, StdoutSinkConfig, SyslogSinkConfig,
};

/// Main configuration structure
///
/// All sections are optional with defaults, except that the section for
/// the selected sink must be present when that sink requires settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the single active destination
    ///
    /// One of: log, stdout, http, syslog, kafka, s3, influxdb,
    /// elasticsearch, eventhub.
    pub sink: String,

    /// Logging configuration
    pub log: LogConfig,

    /// Event counter configuration
    pub metrics: MetricsConfig,

    /// Admission filter over involved objects
    pub filter: EventFilter,

    /// Stdout sink settings
    pub stdout: StdoutSinkConfig,

    /// HTTP sink settings
    pub http: Option<HttpSinkConfig>,

    /// Syslog sink settings
    pub syslog: Option<SyslogSinkConfig>,

    /// Kafka sink settings
    pub kafka: Option<KafkaSinkConfig>,

    /// S3 sink settings
    pub s3: Option<S3SinkConfig>,

    /// InfluxDB sink settings
    pub influxdb: Option<InfluxDbSinkConfig>,

    /// Elasticsearch sink settings
    pub elasticsearch: Option<ElasticsearchSinkConfig>,

    /// Event hub sink settings
    pub eventhub: Option<EventHubSinkConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sink: "log".into(),
            log: LogConfig::default(),
            metrics: MetricsConfig::default(),
            filter: EventFilter::default(),
            stdout: StdoutSinkConfig::default(),
            http: None,
            syslog: None,
            kafka: None,
            s3: None,
            influxdb: None,
            elasticsearch: None,
            eventhub: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML,
    /// or fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse and validate configuration from a TOML string
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Checks that the selected sink is a known destination, its section
    /// is present, and every required field is set and sane.
    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// The selected destination, parsed
    ///
    /// Only meaningful after validation; an unknown name returns `None`.
    pub fn sink_kind(&self) -> Option<SinkKind> {
        SinkKind::from_name(&self.sink)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
