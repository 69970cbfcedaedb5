//! Interactive dashboard page.
//!
//! The page is static; it pulls `/api/v1/dashboard` and draws the charts
//! client-side with Plotly.

use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Serve the dashboard page.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
