use std::sync::Arc;

use analyzer_core::{LookupError, WeatherService, WeatherSummary};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<WeatherService>,
}

pub fn router(service: Arc<WeatherService>) -> Router {
    Router::new()
        .route("/weather", get(weather_summary))
        .route("/health", get(health))
        .with_state(AppState { service })
}

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    city: Option<String>,
}

/// Errors returned by the HTTP layer, rendered as `{"error": "..."}`.
///
/// Upstream rejections (including upstream 5xx) are reported as 400; every
/// other failure is an opaque 500 with the detail logged here.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required parameter: city")]
    MissingCity,

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::MissingCity => {
                warn!("Rejected weather request without a city");
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::Lookup(err) if err.fetch_error().is_upstream_rejection() => {
                warn!(error = %err, "Forecast provider rejected request");
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            ApiError::Lookup(err) => {
                error!(error = ?err.fetch_error(), "Weather lookup failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn weather_summary(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<WeatherSummary>, ApiError> {
    let city = query.city.filter(|c| !c.trim().is_empty()).ok_or(ApiError::MissingCity)?;
    info!(city = %city, "Weather summary requested");

    let summary = state.service.summarize(&city).await?;
    Ok(Json(summary))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "ts": Utc::now().to_rfc3339() }))
}
