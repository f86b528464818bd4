//! Email lookup endpoint.
//!
//! One endpoint serves the four lookup modes. Misses are not errors: they
//! answer 200 with no address, the attempt trail in `logs` and an `error`
//! summary.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use scout_core::waterfall::{Attempt, BulkResolution, PersonResolution};
use scout_core::{EmailMatch, EmailWaterfall, ResolveError};

use super::handlers::{error, ApiError};
use crate::metrics::EMAIL_LOOKUPS_TOTAL;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FindEmailRequest {
    /// person (default), company, decision_maker or linkedin.
    #[serde(default)]
    pub search_type: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub job_roles: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    Person,
    Company,
    DecisionMaker,
    Linkedin,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Person => "person",
            SearchType::Company => "company",
            SearchType::DecisionMaker => "decision_maker",
            SearchType::Linkedin => "linkedin",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "person" => Some(SearchType::Person),
            "company" => Some(SearchType::Company),
            "decision_maker" => Some(SearchType::DecisionMaker),
            "linkedin" => Some(SearchType::Linkedin),
            _ => None,
        }
    }
}

/// One address in a response.
#[derive(Debug, Serialize)]
pub struct EmailItem {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    pub confidence: f64,
    pub source: String,
}

impl EmailItem {
    fn from_match(found: EmailMatch, source: &str) -> Self {
        Self {
            email: found.email,
            full_name: found.full_name,
            job_title: found.role,
            confidence: found.confidence,
            source: source.to_string(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct FindEmailResponse {
    /// Single best address (person and profile lookups).
    pub email: Option<String>,
    pub confidence: f64,
    /// Provider that produced the result.
    pub source: Option<String>,
    pub emails: Vec<EmailItem>,
    /// Human-readable attempt trail.
    pub logs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

const NOT_FOUND: &str = "No verified email found.";

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn attempt_logs(attempts: &[Attempt]) -> impl Iterator<Item = String> + '_ {
    attempts.iter().map(|a| a.to_string())
}

/// POST /api/v1/email/find
pub async fn find_email(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FindEmailRequest>,
) -> Result<Json<FindEmailResponse>, ApiError> {
    let search_type = match trimmed(&body.search_type) {
        Some(s) => SearchType::parse(s).ok_or_else(|| {
            error(
                StatusCode::BAD_REQUEST,
                format!("Unknown search_type: {}", s),
            )
        })?,
        None if trimmed(&body.linkedin_url).is_some() => SearchType::Linkedin,
        None => SearchType::Person,
    };

    let result = match state.waterfall() {
        Some(waterfall) => lookup(waterfall, search_type, &body).await,
        None => Err(error(
            StatusCode::SERVICE_UNAVAILABLE,
            "No email provider configured",
        )),
    };

    let outcome = match &result {
        Ok(response) if response.email.is_some() || !response.emails.is_empty() => "found",
        Ok(_) => "not_found",
        Err(_) => "invalid",
    };
    EMAIL_LOOKUPS_TOTAL
        .with_label_values(&[search_type.as_str(), outcome])
        .inc();

    result.map(Json)
}

async fn lookup(
    waterfall: &EmailWaterfall,
    search_type: SearchType,
    body: &FindEmailRequest,
) -> Result<FindEmailResponse, ApiError> {
    let target = trimmed(&body.domain).or(trimmed(&body.company));

    match search_type {
        SearchType::Person => {
            let (Some(full_name), Some(company)) = (
                trimmed(&body.full_name),
                trimmed(&body.company).or(trimmed(&body.domain)),
            ) else {
                return Err(error(
                    StatusCode::BAD_REQUEST,
                    "full_name and company are required for person search",
                ));
            };
            let resolution = waterfall
                .resolve_person(full_name, company)
                .await
                .map_err(bad_request)?;
            let logs = vec![format!(
                "Input: person search for {:?} at {:?}",
                full_name, company
            )];
            Ok(person_response(resolution, logs, None))
        }
        SearchType::Company => {
            let target = target.ok_or_else(|| {
                error(
                    StatusCode::BAD_REQUEST,
                    "domain or company is required for company search",
                )
            })?;
            let logs = vec![format!("Input: company search for {:?}", target)];
            bulk_response(waterfall.resolve_company(target).await, logs)
        }
        SearchType::DecisionMaker => {
            let (Some(target), Some(roles)) = (target, trimmed(&body.job_roles)) else {
                return Err(error(
                    StatusCode::BAD_REQUEST,
                    "domain or company and job_roles are required for decision maker search",
                ));
            };
            let logs = vec![format!(
                "Input: decision maker search for {:?} at {:?}",
                roles, target
            )];
            bulk_response(waterfall.resolve_role(target, roles).await, logs)
        }
        SearchType::Linkedin => {
            // A profile URL pasted into the company field also counts
            let profile_url = trimmed(&body.linkedin_url).or_else(|| {
                trimmed(&body.company).filter(|c| c.contains("linkedin.com/in/"))
            });
            let Some(profile_url) = profile_url else {
                return Err(error(
                    StatusCode::BAD_REQUEST,
                    "linkedin_url is required for linkedin search",
                ));
            };
            let profile = waterfall
                .resolve_profile(profile_url)
                .await
                .map_err(bad_request)?;

            let mut logs = vec![format!("Input: profile URL {:?}", profile_url)];
            if let Some(name) = &profile.full_name {
                logs.push(format!(
                    "Profile: {}, {} at {}",
                    name,
                    profile.role.as_deref().unwrap_or("unknown role"),
                    profile.organization.as_deref().unwrap_or("unknown organization")
                ));
            }
            let mut response = person_response(profile.resolution, logs, profile.full_name);
            if let Some(item) = response.emails.first_mut() {
                item.job_title = profile.role;
            }
            Ok(response)
        }
    }
}

fn bad_request(e: ResolveError) -> ApiError {
    error(StatusCode::BAD_REQUEST, e.to_string())
}

fn person_response(
    resolution: PersonResolution,
    mut logs: Vec<String>,
    full_name: Option<String>,
) -> FindEmailResponse {
    logs.extend(attempt_logs(&resolution.attempts));

    match (resolution.email, resolution.provider) {
        (Some(email), provider) => {
            let source = provider.unwrap_or_else(|| "cache".to_string());
            logs.push(format!(
                "Found: {} ({:.0}% confidence)",
                email,
                resolution.confidence * 100.0
            ));
            FindEmailResponse {
                email: Some(email.clone()),
                confidence: resolution.confidence,
                source: Some(source.clone()),
                emails: vec![EmailItem {
                    email,
                    full_name,
                    job_title: None,
                    confidence: resolution.confidence,
                    source,
                }],
                logs,
                error: None,
            }
        }
        (None, _) => {
            logs.push(NOT_FOUND.to_string());
            FindEmailResponse {
                logs,
                error: Some(NOT_FOUND.to_string()),
                ..Default::default()
            }
        }
    }
}

fn bulk_response(
    result: Result<BulkResolution, ResolveError>,
    mut logs: Vec<String>,
) -> Result<FindEmailResponse, ApiError> {
    match result {
        Ok(bulk) => {
            logs.extend(attempt_logs(&bulk.attempts));
            logs.push(format!(
                "Found {} verified addresses at {}",
                bulk.emails.len(),
                bulk.domain
            ));
            let emails = bulk
                .emails
                .into_iter()
                .map(|m| EmailItem::from_match(m, &bulk.provider))
                .collect();
            Ok(FindEmailResponse {
                source: Some(bulk.provider),
                emails,
                logs,
                ..Default::default()
            })
        }
        Err(ResolveError::Exhausted { attempts }) => {
            logs.extend(attempt_logs(&attempts));
            logs.push(NOT_FOUND.to_string());
            Ok(FindEmailResponse {
                logs,
                error: Some(NOT_FOUND.to_string()),
                ..Default::default()
            })
        }
        Err(e) => Err(bad_request(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_type_parse() {
        assert_eq!(SearchType::parse("person"), Some(SearchType::Person));
        assert_eq!(
            SearchType::parse("decision_maker"),
            Some(SearchType::DecisionMaker)
        );
        assert_eq!(SearchType::parse("linkedin"), Some(SearchType::Linkedin));
        assert_eq!(SearchType::parse("fax"), None);
    }

    #[test]
    fn test_trimmed_treats_blank_as_missing() {
        assert_eq!(trimmed(&Some("  Acme ".to_string())), Some("Acme"));
        assert_eq!(trimmed(&Some("   ".to_string())), None);
        assert_eq!(trimmed(&None), None);
    }
}
