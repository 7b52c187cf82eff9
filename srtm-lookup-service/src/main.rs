//! SRTM Lookup Service - HTTP microservice adding altitudes to point batches.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SRTM_CACHE_DIR` | Cache root; tiles are kept in its srtm/ subdirectory | None (no caching) |
//! | `SRTM_EARTHDATA_AUTH` | Earthdata credential, base64 of user:password | None |
//! | `SRTM_EARTHDATA_USER` / `SRTM_EARTHDATA_PASSWORD` | Earthdata login | None |
//! | `SRTM_LOW_RES_URL` | 3 arc-second dataset URL prefix | kurviger.de mirror |
//! | `SRTM_HIGH_RES_URL` | 1 arc-second dataset URL prefix | Earthdata SRTMGL1 |
//! | `SRTM_CONTINENT_TABLE` | Continent table file | Built-in |
//! | `SRTM_TIMEOUT_SECS` | HTTP timeout | 300 |
//! | `SRTM_HIGH_RES` | `false` disables the 1 arc-second dataset | true |
//! | `SRTM_PORT` | HTTP server port | 8080 |
//! | `RUST_LOG` | Log level (e.g., "info", "debug") | "info" |
//!
//! ## Endpoints
//!
//! - `POST /lookup` - Fill in altitudes for a batch of points
//! - `GET /tile?lat=X&lon=Y` - Tile name, source URLs and cache state
//! - `GET /health` - Health check
//! - `GET /docs` - OpenAPI documentation (Swagger UI)

use std::net::SocketAddr;
use std::sync::Arc;

use srtm_lookup::LookupConfigBuilder;
use srtm_lookup_service::{handlers, router, AppState};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI documentation for the lookup service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "SRTM Lookup Service",
        version = "0.1.0",
        description = "REST API adding SRTM altitudes to batches of points.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(handlers::post_lookup, handlers::get_tile, handlers::health_check),
    components(schemas(
        handlers::PointBody,
        handlers::LookupRequest,
        handlers::LookupResponse,
        handlers::SummaryBody,
        handlers::TileResponse,
        handlers::TileSourceBody,
        handlers::ErrorResponse,
        handlers::HealthResponse,
    )),
    tags(
        (name = "lookup", description = "Altitude lookup endpoints"),
        (name = "system", description = "System and health endpoints")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "srtm_lookup=info,srtm_lookup_service=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load port from environment (service-specific config)
    let port: u16 = std::env::var("SRTM_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    let config = LookupConfigBuilder::from_env()?.build();
    if config.cache_dir.is_none() {
        tracing::warn!("SRTM_CACHE_DIR not set, tiles will be downloaded for every request");
    }

    tracing::info!(
        cache_dir = ?config.cache_dir,
        high_res = config.high_res,
        has_credential = config.credential.is_some(),
        port = port,
        "Starting SRTM lookup service"
    );

    let state = Arc::new(AppState { config });

    // Build router
    let app = router(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
