use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use super::dto::{DietaryPreferences, Profile};
use super::services::normalize_profile;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(put_profile))
        .route(
            "/profile/preferences",
            get(get_preferences).put(put_preferences),
        )
        .route("/profile/preferences/:name/toggle", post(toggle))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "profile persistence failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[instrument(skip(state))]
pub async fn get_profile(State(state): State<AppState>) -> Json<Profile> {
    Json(state.profiles.load_profile().await)
}

#[instrument(skip(state, payload))]
pub async fn put_profile(
    State(state): State<AppState>,
    Json(payload): Json<Profile>,
) -> Result<Json<Profile>, (StatusCode, String)> {
    let profile = normalize_profile(payload).map_err(|e| {
        warn!(error = %e, "profile rejected");
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;
    state.profiles.save_profile(&profile).await.map_err(internal)?;
    info!(allergens = profile.allergens.len(), "profile saved");
    Ok(Json(profile))
}

#[instrument(skip(state))]
pub async fn get_preferences(State(state): State<AppState>) -> Json<DietaryPreferences> {
    Json(state.profiles.load_preferences().await)
}

#[instrument(skip(state, payload))]
pub async fn put_preferences(
    State(state): State<AppState>,
    Json(payload): Json<DietaryPreferences>,
) -> Result<Json<DietaryPreferences>, (StatusCode, String)> {
    state
        .profiles
        .save_preferences(&payload)
        .await
        .map_err(internal)?;
    Ok(Json(payload))
}

#[instrument(skip(state))]
pub async fn toggle(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<DietaryPreferences>, (StatusCode, String)> {
    let prefs = state
        .profiles
        .toggle(&name)
        .await
        .map_err(internal)?
        .map_err(|e| (StatusCode::NOT_FOUND, e.to_string()))?;
    Ok(Json(prefs))
}
