use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::ledger::RecentScanEntry;
use crate::state::AppState;

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/scans/recent", get(list_recent))
}

#[instrument(skip(state))]
pub async fn list_recent(State(state): State<AppState>) -> Json<Vec<RecentScanEntry>> {
    Json(state.recent.lock().await.entries().to_vec())
}
