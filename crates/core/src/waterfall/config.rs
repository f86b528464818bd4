//! Waterfall configuration.

use serde::{Deserialize, Serialize};

/// Configuration for email resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterfallConfig {
    /// Minimum provider confidence (0.0-1.0) for an address to be accepted.
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f64,

    /// Upper bound on any single provider or search call, in seconds.
    /// A call that runs longer counts as the provider being unavailable.
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    /// Extra organization name to domain entries, consulted before the
    /// built-in directory.
    #[serde(default)]
    pub directory: Vec<DirectoryEntry>,
}

/// One curated organization name to domain mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub domain: String,
}

fn default_threshold() -> f64 {
    0.5
}

fn default_call_timeout() -> u64 {
    10
}

impl Default for WaterfallConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_threshold(),
            call_timeout_secs: default_call_timeout(),
            directory: Vec::new(),
        }
    }
}
