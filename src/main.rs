// Grid Dashboard v0.1
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod errors;
mod helpers;
mod models;
mod routes;
mod services;

use config::AppConfig;
use services::carbon::UK_EMISSION_FACTORS;
use services::elexon::ElexonClient;
use services::fetcher::DataSource;
use services::snapshot::{load_snapshot, SharedSnapshot};

/// Grid Dashboard API: OpenAPI specification.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Grid Dashboard API",
        version = "0.1.0",
        description = "UK electricity dashboard. Loads the Elexon BMRS FUELINST \
            (generation by fuel type) and TSDF (transmission system demand forecast) \
            datasets once at startup, falling back to local files, and serves the \
            generation mix, an estimated carbon intensity and the half-hourly \
            supply minus demand series.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health and data provenance"),
        (name = "Charts", description = "Chart series for the dashboard"),
    ),
    paths(
        routes::health::health_check,
        routes::charts::get_dashboard,
        routes::charts::get_generation_chart,
        routes::charts::get_carbon_intensity_chart,
        routes::charts::get_imbalance_chart,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::charts::DashboardResponse,
            routes::charts::GenerationChart,
            routes::charts::GenerationPoint,
            routes::charts::IntensityChart,
            routes::charts::IntensityPoint,
            routes::charts::ImbalanceChart,
            routes::charts::ImbalancePoint,
            services::snapshot::SourceReport,
            models::Dataset,
            models::FuelCategory,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grid_dashboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    let client = match ElexonClient::new(
        &config.elexon_base_url,
        &config.elexon_user_agent,
        config.http_timeout,
    ) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to create Elexon client: {}", e);
            std::process::exit(1);
        }
    };

    // Remote first, then fallback files
    let sources = [
        DataSource::Remote(client),
        DataSource::LocalDir(config.data_dir.clone()),
    ];

    let snapshot: SharedSnapshot = match load_snapshot(&sources, &UK_EMISSION_FACTORS).await {
        Ok(snapshot) => Arc::new(snapshot),
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    // Read-only API
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);

    let app = routes::router(snapshot)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::new(config.host, config.port);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Dashboard available at http://{}/", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server terminated unexpectedly: {}", e);
        std::process::exit(1);
    }
}
