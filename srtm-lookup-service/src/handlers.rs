//! HTTP request handlers for the altitude lookup service.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use srtm_lookup::{
    AltitudeSurvey, CancelToken, GeoPoint, LookupOptions, LookupOutcome, LookupSummary,
    NoProgress, Tile,
};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::AppState;

/// A point in a lookup batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PointBody {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
    /// Altitude in meters, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

impl From<PointBody> for GeoPoint {
    fn from(p: PointBody) -> Self {
        GeoPoint {
            lat: p.lat,
            lon: p.lon,
            altitude: p.altitude,
        }
    }
}

impl From<GeoPoint> for PointBody {
    fn from(p: GeoPoint) -> Self {
        PointBody {
            lat: p.lat,
            lon: p.lon,
            altitude: p.altitude,
        }
    }
}

/// Batch lookup request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LookupRequest {
    pub points: Vec<PointBody>,
    /// Replace altitudes of exactly zero. Required when the batch mixes zero
    /// and non-zero altitudes; otherwise decided from the batch.
    #[serde(default)]
    pub overwrite_zeros: Option<bool>,
    /// Leave points next to void samples without altitude.
    #[serde(default)]
    pub terrain: bool,
}

/// Counts from a lookup run.
#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryBody {
    pub tiles_total: usize,
    pub tiles_downloaded: usize,
    pub tiles_cached: usize,
    pub tiles_uncached: usize,
    pub tiles_failed: usize,
    pub altitudes_found: usize,
    pub auth_failed: bool,
}

impl From<&LookupSummary> for SummaryBody {
    fn from(s: &LookupSummary) -> Self {
        SummaryBody {
            tiles_total: s.tiles_total,
            tiles_downloaded: s.tiles_downloaded,
            tiles_cached: s.tiles_cached,
            tiles_uncached: s.tiles_uncached,
            tiles_failed: s.tiles_failed,
            altitudes_found: s.altitudes_found,
            auth_failed: s.auth_failed,
        }
    }
}

/// Batch lookup response.
#[derive(Debug, Serialize, ToSchema)]
pub struct LookupResponse {
    /// One of `completed`, `nothing_required`, `none_found`, `failed`, `cancelled`.
    pub outcome: String,
    /// Error reported by a source, for failed lookups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The points in request order, altitudes filled in where found.
    pub points: Vec<PointBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummaryBody>,
}

impl LookupResponse {
    fn new(points: Vec<GeoPoint>, outcome: &LookupOutcome) -> Self {
        let (name, message) = match outcome {
            LookupOutcome::NothingRequired => ("nothing_required", None),
            LookupOutcome::Completed(_) => ("completed", None),
            LookupOutcome::NoneFound(_) => ("none_found", None),
            LookupOutcome::Cancelled(_) => ("cancelled", None),
            LookupOutcome::Failed { message, .. } => ("failed", Some(message.clone())),
        };

        LookupResponse {
            outcome: name.to_string(),
            message,
            points: points.into_iter().map(PointBody::from).collect(),
            summary: outcome.summary().map(SummaryBody::from),
        }
    }
}

/// Query parameters for the tile endpoint.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TileQuery {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

/// Where one dataset keeps a tile.
#[derive(Debug, Serialize, ToSchema)]
pub struct TileSourceBody {
    /// `SRTM1` or `SRTM3`.
    pub dataset: String,
    /// Remote URL, absent if the dataset has no such tile.
    pub url: Option<String>,
    /// A usable copy is in the cache.
    pub cached: bool,
}

/// Tile endpoint response.
#[derive(Debug, Serialize, ToSchema)]
pub struct TileResponse {
    /// Tile name, e.g. `N46E007`.
    pub tile: String,
    /// Datasets in the order they are tried.
    pub sources: Vec<TileSourceBody>,
}

/// Error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Fill in missing altitudes for a batch of points.
///
/// Runs on a blocking worker; tiles not in the cache are downloaded first.
///
/// # Returns
///
/// - `200 OK` with the points and outcome
/// - `400 Bad Request` if a coordinate is invalid, or zero altitudes are
///   ambiguous and `overwrite_zeros` is not set
/// - `502 Bad Gateway` if no altitude was found and a source failed
#[utoipa::path(
    post,
    path = "/lookup",
    request_body = LookupRequest,
    responses(
        (status = 200, description = "Lookup finished", body = LookupResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 502, description = "Tile sources failed", body = LookupResponse),
    ),
    tag = "lookup"
)]
pub async fn post_lookup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LookupRequest>,
) -> Response {
    tracing::debug!(
        points = request.points.len(),
        terrain = request.terrain,
        "Lookup request"
    );

    if let Some(p) = request
        .points
        .iter()
        .find(|p| !valid_coordinate(p.lat, p.lon))
    {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid coordinate: lat {}, lon {}", p.lat, p.lon),
        );
    }

    let mut points: Vec<GeoPoint> = request.points.into_iter().map(GeoPoint::from).collect();
    let survey = AltitudeSurvey::of(&points);
    let overwrite_zeros = match request.overwrite_zeros {
        Some(choice) => choice,
        None if survey.needs_confirmation() => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Points mix zero and non-zero altitudes; set overwrite_zeros".to_string(),
            )
        }
        None => survey.suggested_overwrite_zeros(),
    };
    let options = LookupOptions {
        overwrite_zeros,
        terrain: request.terrain,
    };

    let result = tokio::task::spawn_blocking(move || {
        let mut orchestrator = state.config.orchestrator()?;
        let outcome = orchestrator.run(&mut points, options, &mut NoProgress, &CancelToken::new());
        Ok::<_, srtm_lookup::LookupError>((points, outcome))
    })
    .await;

    match result {
        Ok(Ok((points, outcome))) => {
            let status = match &outcome {
                LookupOutcome::Failed { message, .. } => {
                    tracing::warn!(error = %message, "Lookup failed");
                    StatusCode::BAD_GATEWAY
                }
                _ => {
                    tracing::info!(found = outcome.altitudes_found(), "Lookup finished");
                    StatusCode::OK
                }
            };
            (status, Json(LookupResponse::new(points, &outcome))).into_response()
        }
        Ok(Err(e)) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Lookup task failed: {}", e),
        ),
    }
}

/// Describe the tile containing a coordinate.
///
/// # Returns
///
/// - `200 OK` with the tile name and per-dataset URL and cache state
/// - `400 Bad Request` if the coordinate is invalid
#[utoipa::path(
    get,
    path = "/tile",
    params(TileQuery),
    responses(
        (status = 200, description = "Tile found", body = TileResponse),
        (status = 400, description = "Invalid coordinate", body = ErrorResponse),
    ),
    tag = "lookup"
)]
pub async fn get_tile(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TileQuery>,
) -> Response {
    if !valid_coordinate(query.lat, query.lon) {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid coordinate: lat {}, lon {}", query.lat, query.lon),
        );
    }

    let tile = Tile::for_point(query.lat, query.lon);
    // The HTTP client must not be created or dropped on the async runtime
    let result = tokio::task::spawn_blocking(move || {
        let orchestrator = state.config.orchestrator()?;
        Ok::<_, srtm_lookup::LookupError>(orchestrator.locate(tile))
    })
    .await;

    match result {
        Ok(Ok(locations)) => Json(TileResponse {
            tile: tile.name(),
            sources: locations
                .into_iter()
                .map(|l| TileSourceBody {
                    dataset: l.kind.to_string(),
                    url: l.url,
                    cached: l.cached,
                })
                .collect(),
        })
        .into_response(),
        Ok(Err(e)) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Tile task failed: {}", e),
        ),
    }
}

/// Health check endpoint.
///
/// Returns service status and version.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse)),
    tag = "system"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn valid_coordinate(lat: f64, lon: f64) -> bool {
    GeoPoint::new(lat, lon).has_valid_coordinates()
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}
