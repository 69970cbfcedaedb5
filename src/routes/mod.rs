use axum::{routing::get, Router};

use crate::services::snapshot::SharedSnapshot;

pub mod charts;
pub mod dashboard;
pub mod health;

/// Dashboard page plus the JSON API, all reading the same snapshot.
pub fn router(snapshot: SharedSnapshot) -> Router {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/api/v1/health", get(health::health_check))
        .route("/api/v1/dashboard", get(charts::get_dashboard))
        .route("/api/v1/charts/generation", get(charts::get_generation_chart))
        .route(
            "/api/v1/charts/carbon-intensity",
            get(charts::get_carbon_intensity_chart),
        )
        .route("/api/v1/charts/imbalance", get(charts::get_imbalance_chart))
        .with_state(snapshot)
}
