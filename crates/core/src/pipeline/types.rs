//! Pipeline types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An organization to process, with its estimated headcount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationTarget {
    pub name: String,
    pub headcount: u32,
}

impl OrganizationTarget {
    pub fn new(name: impl Into<String>, headcount: u32) -> Self {
        Self {
            name: name.into(),
            headcount,
        }
    }
}

/// How a candidate entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Found through a profile search.
    Search,
    /// Supplied directly by a caller.
    Direct,
}

/// A person extracted from search results, before email resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub role: String,
    pub organization: String,
    /// Profile page the candidate was found on; empty for direct lookups.
    pub profile_link: String,
    pub provenance: Provenance,
}

/// A candidate with the outcome of email resolution.
///
/// `email` is either a verified address or absent; `confidence` is zero
/// when it is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedContact {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub email: Option<String>,
    pub confidence: f64,
    pub provider: Option<String>,
}

/// Output for one in-scope organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationResult {
    pub organization: String,
    pub band: String,
    pub roles: Vec<String>,
    /// In discovery order: role-query order, then search-result order.
    pub candidates: Vec<ResolvedContact>,
}

/// Counters for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryStats {
    pub queries_issued: usize,
    pub search_failures: usize,
    pub raw_results: usize,
    pub rejected_not_profile: usize,
    pub rejected_duplicate: usize,
    pub rejected_empty_name: usize,
    pub rejected_irrelevant: usize,
    pub emails_resolved: usize,
}

impl DiscoveryStats {
    pub(crate) fn merge(&mut self, other: &DiscoveryStats) {
        self.queries_issued += other.queries_issued;
        self.search_failures += other.search_failures;
        self.raw_results += other.raw_results;
        self.rejected_not_profile += other.rejected_not_profile;
        self.rejected_duplicate += other.rejected_duplicate;
        self.rejected_empty_name += other.rejected_empty_name;
        self.rejected_irrelevant += other.rejected_irrelevant;
        self.emails_resolved += other.emails_resolved;
    }
}

/// Result of a `discover_and_resolve` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub run_id: String,
    /// In input order, out-of-scope organizations excluded.
    pub results: Vec<OrganizationResult>,
    /// Organizations the targeting policy put out of scope.
    pub skipped: Vec<String>,
    pub stats: DiscoveryStats,
}

/// Caller-input errors, raised before any provider call.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid organization at position {index}: name is empty")]
    InvalidOrganization { index: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
