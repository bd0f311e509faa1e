pub mod camera;
pub mod handlers;
pub mod manual;
pub mod pipeline;
pub mod session;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::routes())
}
