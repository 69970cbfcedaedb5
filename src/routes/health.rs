use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::services::snapshot::{SharedSnapshot, SourceReport};

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok" when both datasets came from the remote API, "degraded" when a
    /// local fallback file was used
    pub status: String,
    /// Service version
    pub version: String,
    /// When the data snapshot was loaded
    pub loaded_at: DateTime<Utc>,
    /// Whether generation and demand share at least one half-hour period
    pub supply_demand_overlap: bool,
    /// Provenance of each dataset
    pub sources: Vec<SourceReport>,
}

/// Health check endpoint.
///
/// Always 200 once the service is up; data is loaded before the listener
/// binds. Reports "degraded" when the snapshot was built from fallback files.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    )
)]
pub async fn health_check(State(snapshot): State<SharedSnapshot>) -> Json<HealthResponse> {
    let degraded = snapshot.sources.iter().any(|s| s.fallback);

    Json(HealthResponse {
        status: if degraded {
            "degraded".to_string()
        } else {
            "ok".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        loaded_at: snapshot.loaded_at,
        supply_demand_overlap: snapshot.reconciliation.has_overlap(),
        sources: snapshot.sources.clone(),
    })
}
