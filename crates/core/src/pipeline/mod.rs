//! Discovery-and-resolution pipeline.
//!
//! Drives organizations through query building, search, parsing,
//! deduplication and the email waterfall. Dedup state lives per
//! organization; the resolution cache and the rate limiter are the only
//! state shared between concurrent organization workers.

mod config;
mod dedup;
mod runner;
mod types;

pub use config::PipelineConfig;
pub use dedup::{normalize_profile_link, ProfileDeduplicator};
pub use runner::Pipeline;
pub use types::{
    Candidate, DiscoveryReport, DiscoveryStats, OrganizationResult, OrganizationTarget,
    PipelineError, Provenance, ResolvedContact,
};
