//! Per-destination configuration types
//!
//! One explicit, statically-validated structure per destination, built
//! once at startup and handed to the corresponding adapter. Defaults
//! mirror long-standing operational practice: network sinks buffer up to
//! 1500 records and discard the newest on overflow unless told otherwise.

use std::time::Duration;

use evr_pipeline::OverflowPolicy;
use serde::Deserialize;

/// The closed set of destinations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    /// Structured log line per record
    Log,
    /// JSON per record to stdout
    Stdout,
    /// Coalesced framed lines POSTed to an HTTP drain
    Http,
    /// Coalesced framed lines over a TCP syslog connection
    Syslog,
    /// One message per record to a Kafka topic
    Kafka,
    /// Time-windowed object uploads
    S3,
    /// One point per record to an InfluxDB database
    InfluxDb,
    /// One document per record to an Elasticsearch index
    Elasticsearch,
    /// Size-bounded chunks to an event hub
    EventHub,
}

impl SinkKind {
    /// Parse a destination name as it appears in the `sink` key
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "log" => Some(Self::Log),
            "stdout" => Some(Self::Stdout),
            "http" => Some(Self::Http),
            "syslog" => Some(Self::Syslog),
            "kafka" => Some(Self::Kafka),
            "s3" => Some(Self::S3),
            "influxdb" => Some(Self::InfluxDb),
            "elasticsearch" => Some(Self::Elasticsearch),
            "eventhub" => Some(Self::EventHub),
            _ => None,
        }
    }

    /// The configuration key / display name for this destination
    pub fn name(&self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Stdout => "stdout",
            Self::Http => "http",
            Self::Syslog => "syslog",
            Self::Kafka => "kafka",
            Self::S3 => "s3",
            Self::InfluxDb => "influxdb",
            Self::Elasticsearch => "elasticsearch",
            Self::EventHub => "eventhub",
        }
    }
}

/// Queue settings shared by the buffered network sinks
///
/// Flattened into each sink section, so the keys read as plain per-sink
/// settings:
///
/// ```toml
/// [http]
/// url = "..."
/// buffer_size = 1500
/// overflow = "drop_newest"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    /// Queue capacity in records
    /// Default: 1500
    pub buffer_size: usize,

    /// What happens to an incoming record when the queue is full
    /// Default: drop_newest
    pub overflow: OverflowPolicy,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            buffer_size: 1500,
            overflow: OverflowPolicy::DropNewest,
        }
    }
}

/// Retry settings shared by the HTTP-speaking network sinks
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Retries after the first attempt
    /// Default: 10
    pub max_retries: usize,

    /// Delay before the first retry; doubles per attempt, with jitter
    /// Default: 500ms
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,

    /// Upper bound for the backoff delay
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 10,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Stdout sink configuration
///
/// # Example
///
/// ```toml
/// sink = "stdout"
///
/// [stdout]
/// wrap_key = "cluster_event"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StdoutSinkConfig {
    /// Nest each record under this single key, for downstream indexers
    /// that expect a fixed envelope
    /// Default: none (record is the top-level object)
    pub wrap_key: Option<String>,
}

/// HTTP sink configuration
///
/// # Example
///
/// ```toml
/// [http]
/// url = "https://drain.example.com/events"
/// request_timeout = "30s"
/// max_retries = 10
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSinkConfig {
    /// Endpoint to POST coalesced batches to
    /// Required
    pub url: String,

    /// Per-request timeout
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Queue settings
    #[serde(flatten)]
    pub queue: QueueSettings,

    /// Retry settings
    #[serde(flatten)]
    pub retry: RetrySettings,
}

impl Default for HttpSinkConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            request_timeout: Duration::from_secs(30),
            queue: QueueSettings::default(),
            retry: RetrySettings::default(),
        }
    }
}

/// Syslog sink configuration
///
/// # Example
///
/// ```toml
/// [syslog]
/// endpoint = "logs.example.com"
/// port = 6514
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyslogSinkConfig {
    /// Remote host to connect to
    /// Required
    pub endpoint: String,

    /// Remote TCP port
    /// Required
    pub port: u16,

    /// Connection timeout
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub connection_timeout: Duration,

    /// Write timeout per batch
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub write_timeout: Duration,

    /// Queue settings
    #[serde(flatten)]
    pub queue: QueueSettings,

    /// Retry settings
    #[serde(flatten)]
    pub retry: RetrySettings,
}

impl Default for SyslogSinkConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            port: 0,
            connection_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(5),
            queue: QueueSettings::default(),
            retry: RetrySettings::default(),
        }
    }
}

/// SASL mechanism for Kafka authentication
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SaslMechanism {
    /// PLAIN username/password
    Plain,
    /// SCRAM-SHA-256
    #[serde(rename = "scram-sha-256")]
    ScramSha256,
    /// SCRAM-SHA-512
    #[serde(rename = "scram-sha-512")]
    ScramSha512,
}

impl SaslMechanism {
    /// The mechanism name the client library expects
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::ScramSha256 => "SCRAM-SHA-256",
            Self::ScramSha512 => "SCRAM-SHA-512",
        }
    }
}

/// Kafka sink configuration
///
/// # Example
///
/// ```toml
/// [kafka]
/// brokers = ["kafka-0:9092", "kafka-1:9092"]
/// topic = "cluster-events"
/// async = false
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KafkaSinkConfig {
    /// Broker addresses
    /// Required
    pub brokers: Vec<String>,

    /// Topic to produce to
    /// Default: "cluster-events"
    pub topic: String,

    /// Fire-and-forget producer instead of waiting for acknowledgement
    /// Default: true
    #[serde(rename = "async")]
    pub r#async: bool,

    /// Client-level send retries
    /// Default: 5
    pub retry_max: u32,

    /// Broker acknowledgement timeout for synchronous sends
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub message_timeout: Duration,

    /// SASL username (enables SASL together with `sasl_password`)
    pub sasl_user: Option<String>,

    /// SASL password
    pub sasl_password: Option<String>,

    /// SASL mechanism
    /// Default: plain (when SASL is enabled)
    pub sasl_mechanism: Option<SaslMechanism>,
}

impl Default for KafkaSinkConfig {
    fn default() -> Self {
        Self {
            brokers: Vec::new(),
            topic: "cluster-events".into(),
            r#async: true,
            retry_max: 5,
            message_timeout: Duration::from_secs(30),
            sasl_user: None,
            sasl_password: None,
            sasl_mechanism: None,
        }
    }
}

/// Output format for uploaded S3 objects
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum S3OutputFormat {
    /// Framed `<byte count><SP><json>` lines (default)
    #[default]
    Framed,
    /// Flattened single-level JSON, one object per line, for warehouse
    /// loaders
    FlatJson,
}

/// S3 sink configuration
///
/// # Example
///
/// ```toml
/// [s3]
/// access_key_id = "AKIA..."
/// secret_access_key = "..."
/// region = "us-east-1"
/// bucket = "cluster-events"
/// prefix = "prod"
/// upload_interval = "2m"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct S3SinkConfig {
    /// Static access key ID
    /// Required
    pub access_key_id: String,

    /// Static secret access key
    /// Required
    pub secret_access_key: String,

    /// Bucket region
    /// Required
    pub region: String,

    /// Bucket name
    /// Required
    pub bucket: String,

    /// First-level key prefix inside the bucket
    /// Required
    pub prefix: String,

    /// Minimum time between uploads; batches arriving sooner accumulate
    /// Default: 120s
    #[serde(with = "humantime_serde")]
    pub upload_interval: Duration,

    /// Object content format
    /// Default: framed
    pub format: S3OutputFormat,

    /// Queue settings
    #[serde(flatten)]
    pub queue: QueueSettings,
}

impl Default for S3SinkConfig {
    fn default() -> Self {
        Self {
            access_key_id: String::new(),
            secret_access_key: String::new(),
            region: String::new(),
            bucket: String::new(),
            prefix: String::new(),
            upload_interval: Duration::from_secs(120),
            format: S3OutputFormat::Framed,
            queue: QueueSettings::default(),
        }
    }
}

/// InfluxDB sink configuration
///
/// # Example
///
/// ```toml
/// [influxdb]
/// host = "influx.example.com:8086"
/// username = "writer"
/// password = "..."
/// database = "events"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InfluxDbSinkConfig {
    /// Host (host:port) of the InfluxDB server
    /// Required
    pub host: String,

    /// Username
    /// Required
    pub username: String,

    /// Password
    /// Required
    pub password: String,

    /// Database to write points into; created on demand if missing
    /// Default: "events"
    pub database: String,

    /// Use HTTPS
    /// Default: false
    pub secure: bool,

    /// Skip TLS certificate verification
    /// Default: false
    pub insecure_skip_verify: bool,

    /// Write the event message as a field per tag-heavy point instead of
    /// the whole serialized event as one value field
    /// Default: false
    pub with_fields: bool,

    /// Cluster name stamped on every point
    /// Default: "default"
    pub cluster_name: String,

    /// Per-request timeout
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for InfluxDbSinkConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: String::new(),
            password: String::new(),
            database: "events".into(),
            secure: false,
            insecure_skip_verify: false,
            with_fields: false,
            cluster_name: "default".into(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Elasticsearch sink configuration
///
/// # Example
///
/// ```toml
/// [elasticsearch]
/// url = "https://es.example.com:9200"
/// index = "cluster-events"
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ElasticsearchSinkConfig {
    /// Base URL of the cluster
    /// Required
    pub url: String,

    /// Index to add documents to
    /// Required
    pub index: String,

    /// Basic-auth username
    pub username: Option<String>,

    /// Basic-auth password
    pub password: Option<String>,

    /// API key; takes precedence over basic auth
    pub api_key: Option<String>,

    /// Per-request timeout
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Retry settings
    #[serde(flatten)]
    pub retry: RetrySettings,
}

impl Default for ElasticsearchSinkConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            index: String::new(),
            username: None,
            password: None,
            api_key: None,
            request_timeout: Duration::from_secs(30),
            retry: RetrySettings {
                max_retries: 3,
                ..RetrySettings::default()
            },
        }
    }
}

/// Event hub sink configuration
///
/// # Example
///
/// ```toml
/// [eventhub]
/// endpoint = "https://ns.servicebus.windows.net/cluster-events"
/// sas_token = "SharedAccessSignature sr=..."
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventHubSinkConfig {
    /// Hub endpoint URL (messages are POSTed to `{endpoint}/messages`)
    /// Required
    pub endpoint: String,

    /// Pre-issued shared access signature token
    /// Required
    pub sas_token: String,

    /// Largest chunk of serialized records sent as one message
    /// Default: 1 MiB minus framing overhead
    pub max_message_size: usize,

    /// Per-request timeout
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Queue settings
    #[serde(flatten)]
    pub queue: QueueSettings,

    /// Retry settings
    #[serde(flatten)]
    pub retry: RetrySettings,
}

impl Default for EventHubSinkConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            sas_token: String::new(),
            max_message_size: 1_046_528,
            request_timeout: Duration::from_secs(30),
            queue: QueueSettings::default(),
            retry: RetrySettings::default(),
        }
    }
}
