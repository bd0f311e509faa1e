pub mod display;
pub mod handlers;
pub mod model;
pub mod repo_types;
pub mod services;
pub mod source;
pub mod view;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::lookup_routes())
        .merge(handlers::result_routes())
}
