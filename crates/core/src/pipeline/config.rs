//! Pipeline configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the discovery pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Candidates kept per organization when the caller gives no limit.
    #[serde(default = "default_max_per_organization")]
    pub max_per_organization: usize,

    /// Hits requested from the search backend per role query.
    #[serde(default = "default_results_per_query")]
    pub results_per_query: u32,

    /// Organizations processed at once.
    /// Provider pacing is shared, so raising this does not raise the
    /// request rate against any provider.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_max_per_organization() -> usize {
    5
}

fn default_results_per_query() -> u32 {
    5
}

fn default_concurrency() -> usize {
    1
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_per_organization: default_max_per_organization(),
            results_per_query: default_results_per_query(),
            concurrency: default_concurrency(),
        }
    }
}
