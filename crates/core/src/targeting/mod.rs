//! Targeting policy: which roles to look for, by organization size.
//!
//! Organizations outside every configured band are out of scope and get no
//! band at all, which callers report as "skipped". A band with an empty role
//! list is still in scope.

use serde::{Deserialize, Serialize};

/// One configured headcount range (inclusive on both ends).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandRule {
    pub label: String,
    pub min: u32,
    pub max: u32,
    /// Roles searched for, in query order.
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Targeting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetingConfig {
    #[serde(default = "default_bands")]
    pub bands: Vec<BandRule>,
}

impl Default for TargetingConfig {
    fn default() -> Self {
        Self {
            bands: default_bands(),
        }
    }
}

fn rule(label: &str, min: u32, max: u32, roles: &[&str]) -> BandRule {
    BandRule {
        label: label.to_string(),
        min,
        max,
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

/// Leadership for the smallest firms, HR for growth-stage ones.
pub fn default_bands() -> Vec<BandRule> {
    vec![
        rule("small", 25, 49, &["CEO", "Founder", "Partner", "CIO"]),
        rule("mid-small", 50, 199, &["HR Director"]),
        rule("mid", 200, 500, &["Early Careers Head", "HR Director"]),
    ]
}

/// The band an organization falls in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadcountBand {
    pub label: String,
    pub roles: Vec<String>,
}

/// Maps headcount estimates to bands.
#[derive(Debug, Clone)]
pub struct TargetingPolicy {
    bands: Vec<BandRule>,
}

impl Default for TargetingPolicy {
    fn default() -> Self {
        Self::new(TargetingConfig::default())
    }
}

impl TargetingPolicy {
    pub fn new(config: TargetingConfig) -> Self {
        Self {
            bands: config.bands,
        }
    }

    /// The band containing `headcount`, or `None` when out of scope.
    pub fn band_for(&self, headcount: u32) -> Option<HeadcountBand> {
        self.bands
            .iter()
            .find(|b| b.min <= headcount && headcount <= b.max)
            .map(|b| HeadcountBand {
                label: b.label.clone(),
                roles: b.roles.clone(),
            })
    }

    pub fn bands(&self) -> &[BandRule] {
        &self.bands
    }
}
