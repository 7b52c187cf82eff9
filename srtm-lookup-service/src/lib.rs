//! SRTM Lookup Service Library
//!
//! HTTP handlers and types for the altitude lookup service.
//! This library is used by both the srtm-lookup-service binary and integration tests.

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use srtm_lookup::LookupConfig;

/// Application state shared across handlers.
pub struct AppState {
    /// Settings each request builds its lookup from.
    pub config: LookupConfig,
}

/// Routes of the service, without documentation or middleware.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/lookup", post(handlers::post_lookup))
        .route("/tile", get(handlers::get_tile))
        .route("/health", get(handlers::health_check))
        .with_state(state)
}

// Re-export commonly used types for convenience
pub use handlers::{
    ErrorResponse, HealthResponse, LookupRequest, LookupResponse, PointBody, SummaryBody,
    TileQuery, TileResponse, TileSourceBody,
};
