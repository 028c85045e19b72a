//! Event counter configuration

use serde::Deserialize;

/// Configuration for the event counter registry
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Whether accepted events are counted at all
    /// Default: true
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
