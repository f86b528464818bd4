//! Provider-neutral types for email verification services.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Verification status, normalized across providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// The provider positively verified the address.
    Verified,
    /// The provider returned an address without verifying it.
    Unverified,
    /// Deliverability is doubtful (catch-all domains and the like).
    Risky,
    Invalid,
    Blacklisted,
    NotFound,
}

impl VerificationStatus {
    /// Statuses that must never be surfaced, whatever the confidence.
    pub fn is_rejected(&self) -> bool {
        matches!(
            self,
            VerificationStatus::Risky | VerificationStatus::Invalid | VerificationStatus::Blacklisted
        )
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VerificationStatus::Verified => "verified",
            VerificationStatus::Unverified => "unverified",
            VerificationStatus::Risky => "risky",
            VerificationStatus::Invalid => "invalid",
            VerificationStatus::Blacklisted => "blacklisted",
            VerificationStatus::NotFound => "not_found",
        };
        f.write_str(s)
    }
}

/// One address returned by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMatch {
    /// Trimmed, lowercased address.
    pub email: String,
    /// Provider certainty, 0.0 to 1.0.
    pub confidence: f64,
    pub status: VerificationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

impl EmailMatch {
    pub fn new(email: impl Into<String>, confidence: f64, status: VerificationStatus) -> Self {
        Self {
            email: email.into(),
            confidence,
            status,
            full_name: None,
            role: None,
            organization: None,
        }
    }

    pub fn with_person(mut self, full_name: Option<String>, role: Option<String>) -> Self {
        self.full_name = full_name.filter(|s| !s.trim().is_empty());
        self.role = role.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_organization(mut self, organization: Option<String>) -> Self {
        self.organization = organization.filter(|s| !s.trim().is_empty());
        self
    }
}

/// Decision-maker categories understood by role lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionMakerCategory {
    Ceo,
    Engineering,
    Finance,
    Hr,
    It,
    Logistics,
    Marketing,
    Operations,
    Buyer,
    Sales,
}

impl DecisionMakerCategory {
    pub const ALL: [DecisionMakerCategory; 10] = [
        DecisionMakerCategory::Ceo,
        DecisionMakerCategory::Engineering,
        DecisionMakerCategory::Finance,
        DecisionMakerCategory::Hr,
        DecisionMakerCategory::It,
        DecisionMakerCategory::Logistics,
        DecisionMakerCategory::Marketing,
        DecisionMakerCategory::Operations,
        DecisionMakerCategory::Buyer,
        DecisionMakerCategory::Sales,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionMakerCategory::Ceo => "ceo",
            DecisionMakerCategory::Engineering => "engineering",
            DecisionMakerCategory::Finance => "finance",
            DecisionMakerCategory::Hr => "hr",
            DecisionMakerCategory::It => "it",
            DecisionMakerCategory::Logistics => "logistics",
            DecisionMakerCategory::Marketing => "marketing",
            DecisionMakerCategory::Operations => "operations",
            DecisionMakerCategory::Buyer => "buyer",
            DecisionMakerCategory::Sales => "sales",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            DecisionMakerCategory::Ceo => &[
                "ceo", "chief executive", "founder", "managing director", "owner", "president",
                "partner",
            ],
            DecisionMakerCategory::Engineering => &["engineering", "cto", "technology", "developer"],
            DecisionMakerCategory::Finance => &["finance", "cfo", "financial", "accounting"],
            DecisionMakerCategory::Hr => &[
                "hr", "human resources", "people", "talent", "recruit", "careers",
            ],
            DecisionMakerCategory::It => &["it", "cio", "information", "systems"],
            DecisionMakerCategory::Logistics => &["logistics", "supply chain"],
            DecisionMakerCategory::Marketing => &["marketing", "cmo", "brand"],
            DecisionMakerCategory::Operations => &["operations", "coo"],
            DecisionMakerCategory::Buyer => &["buyer", "procurement", "purchasing"],
            DecisionMakerCategory::Sales => &["sales", "business development", "revenue"],
        }
    }

    /// Map free-text role keywords onto a category.
    ///
    /// Matches whole words (or whole multi-word phrases), checking categories
    /// in declaration order.
    pub fn from_keywords(text: &str) -> Option<Self> {
        if let Ok(category) = text.parse() {
            return Some(category);
        }

        let normalized: String = text
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();
        let padded = format!(" {} ", normalized.split_whitespace().collect::<Vec<_>>().join(" "));

        Self::ALL.into_iter().find(|category| {
            category.keywords().iter().any(|keyword| {
                let needle = format!(" {} ", keyword);
                padded.contains(&needle)
                    || (keyword.len() > 3 && padded.contains(&format!(" {}", keyword)))
            })
        })
    }
}

impl FromStr for DecisionMakerCategory {
    type Err = EmailProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| EmailProviderError::InvalidInput(format!("unknown category: {}", s)))
    }
}

/// What a role lookup is looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleQuery {
    /// The caller's role text, e.g. "Head of People".
    pub text: String,
    /// Category derived from the text, if one matched.
    pub category: Option<DecisionMakerCategory>,
}

impl RoleQuery {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let category = DecisionMakerCategory::from_keywords(&text);
        Self { text, category }
    }
}

/// Why one provider attempt did not yield a usable address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissReason {
    /// Transport failure, timeout, auth or quota problem.
    ProviderUnavailable,
    /// The provider answered but found nothing.
    NoMatch,
    /// An address came back below the threshold or flagged risky.
    LowConfidence,
    /// The provider has no endpoint for this lookup mode.
    Unsupported,
}

impl MissReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissReason::ProviderUnavailable => "provider_unavailable",
            MissReason::NoMatch => "no_match",
            MissReason::LowConfidence => "low_confidence",
            MissReason::Unsupported => "unsupported",
        }
    }
}

/// Errors returned by email providers.
#[derive(Debug, Clone, Error)]
pub enum EmailProviderError {
    #[error("no email found")]
    NotFound,

    #[error("confidence {0:.2} below threshold")]
    LowConfidence(f64),

    #[error("address flagged {status}")]
    Rejected { status: VerificationStatus },

    #[error("provider credits exhausted")]
    QuotaExceeded,

    #[error("provider rejected the API key")]
    Unauthorized,

    #[error("provider rate limited the request")]
    RateLimited,

    #[error("provider call timed out")]
    Timeout,

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to parse provider response: {0}")]
    ParseError(String),

    #[error("lookup not supported: {0}")]
    Unsupported(String),
}

impl EmailProviderError {
    /// Classify the failure for the waterfall's attempt log.
    pub fn miss_reason(&self) -> MissReason {
        match self {
            EmailProviderError::NotFound | EmailProviderError::InvalidInput(_) => MissReason::NoMatch,
            EmailProviderError::LowConfidence(_) | EmailProviderError::Rejected { .. } => {
                MissReason::LowConfidence
            }
            EmailProviderError::Unsupported(_) => MissReason::Unsupported,
            EmailProviderError::QuotaExceeded
            | EmailProviderError::Unauthorized
            | EmailProviderError::RateLimited
            | EmailProviderError::Timeout
            | EmailProviderError::Unavailable(_)
            | EmailProviderError::ParseError(_) => MissReason::ProviderUnavailable,
        }
    }

    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            EmailProviderError::Timeout
        } else if e.is_decode() {
            EmailProviderError::ParseError(e.to_string())
        } else {
            EmailProviderError::Unavailable(e.to_string())
        }
    }
}

/// Trait for email finding and verification services.
///
/// Adapters normalize their provider's response shape, status vocabulary
/// and confidence scale into [`EmailMatch`].
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Provider name for logging, caching and rate limiting.
    fn name(&self) -> &str;

    /// Whether lookups need an apex domain rather than a free-text
    /// organization name.
    fn requires_domain(&self) -> bool;

    /// Find one person's address.
    async fn find_person(
        &self,
        full_name: &str,
        organization_or_domain: &str,
    ) -> Result<EmailMatch, EmailProviderError>;

    /// Bulk lookup of addresses at an organization.
    async fn find_at_organization(&self, domain: &str)
        -> Result<Vec<EmailMatch>, EmailProviderError>;

    /// Addresses of people in a role or department at an organization.
    async fn find_by_role(
        &self,
        domain: &str,
        role: &RoleQuery,
    ) -> Result<Vec<EmailMatch>, EmailProviderError>;

    /// Reverse lookup from a public profile URL.
    async fn find_by_profile(&self, _profile_url: &str) -> Result<EmailMatch, EmailProviderError> {
        Err(EmailProviderError::Unsupported(format!(
            "{} has no profile lookup",
            self.name()
        )))
    }
}

/// Trim and lowercase an address; `None` if it is not an address.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Some(email),
        _ => None,
    }
}

/// Split a full name into first name and the remainder.
pub fn split_full_name(full_name: &str) -> Result<(String, String), EmailProviderError> {
    let mut parts = full_name.split_whitespace();
    let first = parts
        .next()
        .ok_or_else(|| EmailProviderError::InvalidInput("empty name".to_string()))?;
    let last = parts.collect::<Vec<_>>().join(" ");
    Ok((first.to_string(), last))
}

/// Keep a 0-1 confidence inside its range.
pub(crate) fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
