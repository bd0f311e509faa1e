use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::{instrument, warn};

use super::session::ScannerState;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/scanner", get(get_scanner))
        .route("/scanner/open", post(open_scanner))
        .route("/scanner/close", post(close_scanner))
        .route("/scanner/retry", post(retry_scanner))
        .route("/scanner/manual", post(manual_decode))
}

#[derive(Debug, Deserialize)]
pub struct ManualDecodeRequest {
    pub barcode: String,
}

#[instrument(skip(state))]
pub async fn get_scanner(State(state): State<AppState>) -> Json<ScannerState> {
    Json(state.scanner.state())
}

#[instrument(skip(state))]
pub async fn open_scanner(State(state): State<AppState>) -> Json<ScannerState> {
    Json(state.scanner.open().await)
}

#[instrument(skip(state))]
pub async fn close_scanner(State(state): State<AppState>) -> Json<ScannerState> {
    Json(state.scanner.close().await)
}

#[instrument(skip(state))]
pub async fn retry_scanner(State(state): State<AppState>) -> Json<ScannerState> {
    Json(state.scanner.retry().await)
}

/// Feeds a barcode to the manual camera, standing in for a decoded frame.
#[instrument(skip(state, body))]
pub async fn manual_decode(
    State(state): State<AppState>,
    Json(body): Json<ManualDecodeRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let Some(camera) = state.manual_camera.as_ref() else {
        return Err((StatusCode::NOT_FOUND, "Manual camera not configured".into()));
    };
    if body.barcode.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "barcode is required".into()));
    }
    if state.scanner.state() != ScannerState::Scanning {
        return Err((StatusCode::CONFLICT, "Scanner is not active".into()));
    }
    camera.inject(body.barcode.trim()).map_err(|e| {
        warn!(error = %e, "manual decode rejected");
        (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
    })?;
    Ok(StatusCode::ACCEPTED)
}
