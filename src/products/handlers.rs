use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use super::display::{NutritionDisplay, ServingMultiplier};
use super::services::{lookup_and_record, DEMO_BARCODE};
use super::source::LookupError;
use super::view::ResultSnapshot;
use crate::state::AppState;

pub fn lookup_routes() -> Router<AppState> {
    Router::new()
        .route("/products/demo", post(demo_lookup))
        .route("/products/:barcode", get(lookup))
}

pub fn result_routes() -> Router<AppState> {
    Router::new()
        .route("/result", get(get_result).delete(reset_result))
        .route("/result/serving", put(set_serving))
        .route("/result/error", delete(dismiss_error))
}

#[derive(Debug, Deserialize)]
pub struct ServingRequest {
    pub multiplier: ServingMultiplier,
}

fn lookup_status(e: &LookupError) -> StatusCode {
    match e {
        LookupError::InvalidBarcode => StatusCode::BAD_REQUEST,
        LookupError::NotFound(_) => StatusCode::NOT_FOUND,
        LookupError::Failed(_) => StatusCode::BAD_GATEWAY,
    }
}

async fn lookup_display(
    state: &AppState,
    barcode: &str,
) -> Result<Json<NutritionDisplay>, (StatusCode, String)> {
    let product = lookup_and_record(state, barcode)
        .await
        .map_err(|e| (lookup_status(&e), e.to_string()))?;
    Ok(Json(NutritionDisplay::render(
        &product,
        ServingMultiplier::default(),
    )))
}

#[instrument(skip(state))]
pub async fn lookup(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> Result<Json<NutritionDisplay>, (StatusCode, String)> {
    lookup_display(&state, &barcode).await
}

#[instrument(skip(state))]
pub async fn demo_lookup(
    State(state): State<AppState>,
) -> Result<Json<NutritionDisplay>, (StatusCode, String)> {
    lookup_display(&state, DEMO_BARCODE).await
}

#[instrument(skip(state))]
pub async fn get_result(State(state): State<AppState>) -> Json<ResultSnapshot> {
    Json(state.result.lock().await.snapshot())
}

#[instrument(skip(state, body))]
pub async fn set_serving(
    State(state): State<AppState>,
    Json(body): Json<ServingRequest>,
) -> Result<Json<ResultSnapshot>, (StatusCode, String)> {
    let mut view = state.result.lock().await;
    if view.product().is_none() {
        return Err((StatusCode::CONFLICT, "No product to scale".into()));
    }
    view.set_multiplier(body.multiplier);
    Ok(Json(view.snapshot()))
}

#[instrument(skip(state))]
pub async fn reset_result(State(state): State<AppState>) -> Json<ResultSnapshot> {
    let mut view = state.result.lock().await;
    view.reset();
    Json(view.snapshot())
}

#[instrument(skip(state))]
pub async fn dismiss_error(State(state): State<AppState>) -> Json<ResultSnapshot> {
    let mut view = state.result.lock().await;
    view.dismiss_error();
    Json(view.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn call(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if body.is_some() {
            req = req.header("content-type", "application/json");
        }
        let req = req
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    async fn app() -> Router {
        let (state, _rx) = AppState::fake().await;
        lookup_routes().merge(result_routes()).with_state(state)
    }

    #[tokio::test]
    async fn lookup_then_scale_serving() {
        let app = app().await;
        let (status, body) = call(&app, "GET", "/products/7622210449283", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["calories"], "442");
        assert_eq!(body["protein"], "12g");
        assert_eq!(body["fiber"], "not available");

        let (status, body) = call(&app, "PUT", "/result/serving", Some(r#"{"multiplier": 2.0}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["nutrition"]["protein"], "24g");
    }

    #[tokio::test]
    async fn out_of_range_serving_is_rejected() {
        let app = app().await;
        call(&app, "POST", "/products/demo", None).await;
        let (status, _) = call(&app, "PUT", "/result/serving", Some(r#"{"multiplier": 5}"#)).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn not_found_maps_to_404_and_error_is_dismissible() {
        let app = app().await;
        let (status, _) = call(&app, "GET", "/products/0000000000000", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = call(&app, "GET", "/result", None).await;
        assert_eq!(body["error"]["code"], "product-not-found");
        assert!(body["nutrition"].is_null());

        let (_, body) = call(&app, "DELETE", "/result/error", None).await;
        assert!(body["error"].is_null());
    }
}
