//! Anymail Finder (v5.1) adapter. Primary provider.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::config::{default_rate_limit, default_timeout};

use super::types::{clamp_confidence, normalize_email};
use super::{EmailMatch, EmailProvider, EmailProviderError, RoleQuery, VerificationStatus};

/// Anymail Finder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnymailConfig {
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_rpm: u32,
}

fn default_base_url() -> String {
    "https://api.anymailfinder.com".to_string()
}

/// Anymail Finder client.
///
/// Accepts either a company name or a domain for person lookups, so it is
/// queried before any domain resolution happens.
pub struct AnymailProvider {
    client: Client,
    config: AnymailConfig,
}

impl AnymailProvider {
    pub fn new(config: AnymailConfig) -> Result<Self, EmailProviderError> {
        if config.api_key.trim().is_empty() {
            return Err(EmailProviderError::Unauthorized);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| EmailProviderError::Unavailable(format!("HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/v5.1/find-email/{}",
            self.config.base_url.trim_end_matches('/'),
            path
        )
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, EmailProviderError> {
        debug!(endpoint = path, "Calling Anymail Finder");
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.config.api_key)
            .json(&body)
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
        StatusCode::BAD_REQUEST => EmailProviderError::InvalidInput(error_message(body)),
        _ => EmailProviderError::Unavailable(format!("HTTP {}: {}", status, error_message(body))),
    }
}

/// Pull `error` / `error_explained` / `message` out of an error body.
fn error_message(body: &str) -> String {
    #[derive(Deserialize, Default)]
    struct ErrorBody {
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        error_explained: Option<String>,
        #[serde(default)]
        message: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    match (parsed.error, parsed.error_explained, parsed.message) {
        (Some(e), Some(x), _) => format!("{}: {}", e, x),
        (Some(e), None, _) => e,
        (None, _, Some(m)) => m,
        _ => body.chars().take(200).collect(),
    }
}

/// Person, decision-maker and profile endpoints share this shape.
#[derive(Debug, Deserialize)]
struct PersonResponse {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_status: Option<String>,
    #[serde(default)]
    valid_email: Option<String>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    person_full_name: Option<String>,
    #[serde(default)]
    person_job_title: Option<String>,
    #[serde(default)]
    person_company_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompanyResponse {
    #[serde(default)]
    email_status: Option<String>,
    #[serde(default)]
    valid_emails: Vec<String>,
}

fn parse_status(raw: Option<&str>) -> VerificationStatus {
    match raw.map(|s| s.trim().to_lowercase()).as_deref() {
        Some("valid") => VerificationStatus::Verified,
        Some("risky") => VerificationStatus::Risky,
        Some("blacklisted") => VerificationStatus::Blacklisted,
        Some("not_found") => VerificationStatus::NotFound,
        Some("invalid") => VerificationStatus::Invalid,
        _ => VerificationStatus::Unverified,
    }
}

impl PersonResponse {
    /// Normalize into a match, rejecting anything not usable.
    fn into_match(self) -> Result<EmailMatch, EmailProviderError> {
        let status = parse_status(self.email_status.as_deref());
        match status {
            VerificationStatus::NotFound => return Err(EmailProviderError::NotFound),
            s if s.is_rejected() => return Err(EmailProviderError::Rejected { status: s }),
            _ => {}
        }

        // valid_email is only present when the address is deliverable.
        let (raw, status) = match self.valid_email.filter(|e| !e.trim().is_empty()) {
            Some(valid) => (Some(valid), VerificationStatus::Verified),
            None => (self.email, status),
        };
        let email = raw
            .as_deref()
            .and_then(normalize_email)
            .ok_or(EmailProviderError::NotFound)?;

        let confidence = match self.score.or(self.confidence) {
            Some(value) if value > 0.0 => clamp_confidence(value),
            _ if status == VerificationStatus::Verified => 1.0,
            _ => 0.0,
        };

        Ok(EmailMatch::new(email, confidence, status)
            .with_person(self.person_full_name, self.person_job_title)
            .with_organization(self.person_company_name))
    }
}

fn looks_like_domain(value: &str) -> bool {
    let value = value.trim();
    value.contains('.') && !value.contains(char::is_whitespace)
}

#[async_trait]
impl EmailProvider for AnymailProvider {
    fn name(&self) -> &str {
        "anymail"
    }

    fn requires_domain(&self) -> bool {
        false
    }

    async fn find_person(
        &self,
        full_name: &str,
        organization_or_domain: &str,
    ) -> Result<EmailMatch, EmailProviderError> {
        if full_name.trim().is_empty() || organization_or_domain.trim().is_empty() {
            return Err(EmailProviderError::InvalidInput(
                "full name and organization are required".to_string(),
            ));
        }

        let target = organization_or_domain.trim();
        let body = if looks_like_domain(target) {
            json!({ "full_name": full_name.trim(), "domain": target })
        } else {
            json!({ "full_name": full_name.trim(), "company_name": target })
        };

        let response: PersonResponse = self.post("person", body).await?;
        response.into_match()
    }

    async fn find_at_organization(
        &self,
        domain: &str,
    ) -> Result<Vec<EmailMatch>, EmailProviderError> {
        if domain.trim().is_empty() {
            return Err(EmailProviderError::InvalidInput("domain is required".to_string()));
        }

        let response: CompanyResponse = self
            .post("company", json!({ "domain": domain.trim() }))
            .await?;

        let status = parse_status(response.email_status.as_deref());
        if status == VerificationStatus::NotFound {
            return Err(EmailProviderError::NotFound);
        }

        // Only the valid_emails list is verified; the raw list is ignored.
        Ok(response
            .valid_emails
            .iter()
            .filter_map(|e| normalize_email(e))
            .map(|e| EmailMatch::new(e, 1.0, VerificationStatus::Verified))
            .collect())
    }

    async fn find_by_role(
        &self,
        domain: &str,
        role: &RoleQuery,
    ) -> Result<Vec<EmailMatch>, EmailProviderError> {
        let category = role.category.ok_or_else(|| {
            EmailProviderError::Unsupported(format!("no decision-maker category for '{}'", role.text))
        })?;

        let response: PersonResponse = self
            .post(
                "decision-maker",
                json!({
                    "domain": domain.trim(),
                    "decision_maker_category": category.as_str(),
                }),
            )
            .await?;

        Ok(vec![response.into_match()?])
    }

    async fn find_by_profile(&self, profile_url: &str) -> Result<EmailMatch, EmailProviderError> {
        if profile_url.trim().is_empty() {
            return Err(EmailProviderError::InvalidInput("profile URL is required".to_string()));
        }

        let response: PersonResponse = self
            .post("linkedin-url", json!({ "linkedin_url": profile_url.trim() }))
            .await?;
        response.into_match()
    }
}
