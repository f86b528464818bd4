//! Targeting policy endpoint.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BandQuery {
    pub headcount: u32,
}

/// The band for a headcount, or `skip: true` when out of scope.
#[derive(Debug, Serialize)]
pub struct BandResponse {
    pub headcount: u32,
    pub skip: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

/// GET /api/v1/targeting/band?headcount=N
pub async fn get_band(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BandQuery>,
) -> Json<BandResponse> {
    let response = match state.policy().band_for(query.headcount) {
        Some(band) => BandResponse {
            headcount: query.headcount,
            skip: false,
            label: Some(band.label),
            roles: Some(band.roles),
        },
        None => BandResponse {
            headcount: query.headcount,
            skip: true,
            label: None,
            roles: None,
        },
    };
    Json(response)
}
