//! Discovery pipeline endpoint.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use scout_core::{DiscoveryReport, OrganizationTarget};

use super::handlers::{error, ApiError};
use crate::metrics::PIPELINE_RUNS_TOTAL;
use crate::state::AppState;

/// One company to process.
#[derive(Debug, Deserialize)]
pub struct CompanyRequest {
    pub company_name: String,
    /// Estimated employee count.
    pub headcount: u32,
}

/// Request to run discovery and resolution.
#[derive(Debug, Deserialize)]
pub struct RunPipelineRequest {
    pub companies: Vec<CompanyRequest>,
    /// Candidates kept per company (default: the configured maximum).
    #[serde(default)]
    pub max_per_company: Option<usize>,
}

/// POST /api/v1/pipeline/run
///
/// Find people at each company and resolve their addresses. Runs to
/// completion before responding.
pub async fn run_pipeline(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RunPipelineRequest>,
) -> Result<Json<DiscoveryReport>, ApiError> {
    let pipeline = state.pipeline().ok_or_else(|| {
        error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Search backend not configured",
        )
    })?;

    if body.companies.is_empty() {
        PIPELINE_RUNS_TOTAL.with_label_values(&["invalid"]).inc();
        return Err(error(StatusCode::BAD_REQUEST, "companies must not be empty"));
    }

    let targets: Vec<OrganizationTarget> = body
        .companies
        .into_iter()
        .map(|c| OrganizationTarget::new(c.company_name, c.headcount))
        .collect();

    info!(companies = targets.len(), "Pipeline run requested");

    match pipeline
        .discover_and_resolve(&targets, body.max_per_company.unwrap_or(0))
        .await
    {
        Ok(report) => {
            PIPELINE_RUNS_TOTAL.with_label_values(&["completed"]).inc();
            Ok(Json(report))
        }
        Err(e) => {
            // Every pipeline error is a caller-input error
            PIPELINE_RUNS_TOTAL.with_label_values(&["invalid"]).inc();
            Err(error(StatusCode::BAD_REQUEST, e.to_string()))
        }
    }
}
