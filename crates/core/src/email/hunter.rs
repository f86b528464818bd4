//! Hunter (v2) adapter. Secondary provider; every lookup needs a domain.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::{default_rate_limit, default_timeout};

use super::types::{clamp_confidence, normalize_email, split_full_name};
use super::{
    DecisionMakerCategory, EmailMatch, EmailProvider, EmailProviderError, RoleQuery,
    VerificationStatus,
};

/// Hunter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HunterConfig {
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_rpm: u32,
}

fn default_base_url() -> String {
    "https://api.hunter.io".to_string()
}

/// Hunter client.
pub struct HunterProvider {
    client: Client,
    config: HunterConfig,
}

impl HunterProvider {
    pub fn new(config: HunterConfig) -> Result<Self, EmailProviderError> {
        if config.api_key.trim().is_empty() {
            return Err(EmailProviderError::Unauthorized);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| EmailProviderError::Unavailable(format!("HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, EmailProviderError> {
        debug!(endpoint = path, "Calling Hunter");
        let url = format!("{}/v2/{}", self.config.base_url.trim_end_matches('/'), path);
        let response = self
            .client
            .get(url)
            .query(params)
            .query(&[("api_key", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(EmailProviderError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| EmailProviderError::ParseError(e.to_string()))
    }
}

fn map_status(status: StatusCode, body: &str) -> EmailProviderError {
    match status {
        StatusCode::UNAUTHORIZED => EmailProviderError::Unauthorized,
        StatusCode::PAYMENT_REQUIRED => EmailProviderError::QuotaExceeded,
        StatusCode::TOO_MANY_REQUESTS => EmailProviderError::RateLimited,
        StatusCode::NOT_FOUND => EmailProviderError::NotFound,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            EmailProviderError::InvalidInput(error_details(body))
        }
        _ => EmailProviderError::Unavailable(format!("HTTP {}: {}", status, error_details(body))),
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEntry {
    #[serde(default)]
    details: String,
}

/// First `errors[].details` of an error body.
fn error_details(body: &str) -> String {
    #[derive(Deserialize, Default)]
    struct ErrorBody {
        #[serde(default)]
        errors: Vec<ErrorEntry>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .unwrap_or_default()
        .errors
        .into_iter()
        .next()
        .map(|e| e.details)
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[derive(Debug, Default, Deserialize)]
struct Verification {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FinderResponse {
    data: Option<FinderData>,
}

#[derive(Debug, Deserialize)]
struct FinderData {
    #[serde(default)]
    email: Option<String>,
    /// 0-100.
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    verification: Option<Verification>,
}

#[derive(Debug, Deserialize)]
struct DomainSearchResponse {
    data: Option<DomainSearchData>,
}

#[derive(Debug, Deserialize)]
struct DomainSearchData {
    #[serde(default)]
    organization: Option<String>,
    #[serde(default)]
    emails: Vec<DomainEmail>,
}

#[derive(Debug, Deserialize)]
struct DomainEmail {
    value: String,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    position: Option<String>,
    /// 0-100.
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    verification: Option<Verification>,
}

fn parse_status(verification: Option<&Verification>) -> VerificationStatus {
    let raw = verification
        .and_then(|v| v.status.as_deref())
        .map(|s| s.trim().to_lowercase());
    match raw.as_deref() {
        Some("valid") => VerificationStatus::Verified,
        Some("accept_all") => VerificationStatus::Risky,
        Some("invalid") => VerificationStatus::Invalid,
        _ => VerificationStatus::Unverified,
    }
}

fn percent(value: Option<f64>) -> f64 {
    clamp_confidence(value.unwrap_or(0.0) / 100.0)
}

/// Hunter's department filter for a role lookup.
fn department(role: &RoleQuery) -> String {
    match role.category {
        Some(DecisionMakerCategory::Ceo) => "executive".to_string(),
        Some(DecisionMakerCategory::Engineering) | Some(DecisionMakerCategory::It) => {
            "it".to_string()
        }
        Some(DecisionMakerCategory::Finance) => "finance".to_string(),
        Some(DecisionMakerCategory::Hr) => "hr".to_string(),
        Some(DecisionMakerCategory::Marketing) => "marketing".to_string(),
        Some(DecisionMakerCategory::Sales) => "sales".to_string(),
        Some(DecisionMakerCategory::Logistics)
        | Some(DecisionMakerCategory::Operations)
        | Some(DecisionMakerCategory::Buyer) => "operations".to_string(),
        None => role.text.trim().to_lowercase(),
    }
}

impl DomainSearchData {
    fn into_matches(self) -> Vec<EmailMatch> {
        let organization = self.organization;
        self.emails
            .into_iter()
            .filter_map(|e| {
                let email = normalize_email(&e.value)?;
                let full_name = format!(
                    "{} {}",
                    e.first_name.unwrap_or_default(),
                    e.last_name.unwrap_or_default()
                )
                .trim()
                .to_string();
                Some(
                    EmailMatch::new(email, percent(e.confidence), parse_status(e.verification.as_ref()))
                        .with_person(Some(full_name), e.position)
                        .with_organization(organization.clone()),
                )
            })
            .collect()
    }
}

#[async_trait]
impl EmailProvider for HunterProvider {
    fn name(&self) -> &str {
        "hunter"
    }

    fn requires_domain(&self) -> bool {
        true
    }

    async fn find_person(
        &self,
        full_name: &str,
        organization_or_domain: &str,
    ) -> Result<EmailMatch, EmailProviderError> {
        let (first_name, last_name) = split_full_name(full_name)?;
        let domain = organization_or_domain.trim();
        if domain.is_empty() {
            return Err(EmailProviderError::InvalidInput("domain is required".to_string()));
        }

        let response: FinderResponse = self
            .get(
                "email-finder",
                &[
                    ("domain", domain),
                    ("first_name", first_name.as_str()),
                    ("last_name", last_name.as_str()),
                ],
            )
            .await?;

        let data = response.data.ok_or(EmailProviderError::NotFound)?;
        let email = data
            .email
            .as_deref()
            .and_then(normalize_email)
            .ok_or(EmailProviderError::NotFound)?;

        let status = parse_status(data.verification.as_ref());
        if status.is_rejected() {
            return Err(EmailProviderError::Rejected { status });
        }

        Ok(EmailMatch::new(email, percent(data.score), status)
            .with_person(Some(full_name.trim().to_string()), data.position))
    }

    async fn find_at_organization(
        &self,
        domain: &str,
    ) -> Result<Vec<EmailMatch>, EmailProviderError> {
        if domain.trim().is_empty() {
            return Err(EmailProviderError::InvalidInput("domain is required".to_string()));
        }

        let response: DomainSearchResponse = self
            .get("domain-search", &[("domain", domain.trim())])
            .await?;
        Ok(response.data.map(|d| d.into_matches()).unwrap_or_default())
    }

    async fn find_by_role(
        &self,
        domain: &str,
        role: &RoleQuery,
    ) -> Result<Vec<EmailMatch>, EmailProviderError> {
        if domain.trim().is_empty() {
            return Err(EmailProviderError::InvalidInput("domain is required".to_string()));
        }

        let department = department(role);
        let response: DomainSearchResponse = self
            .get(
                "domain-search",
                &[("domain", domain.trim()), ("department", department.as_str())],
            )
            .await?;
        Ok(response.data.map(|d| d.into_matches()).unwrap_or_default())
    }
}
