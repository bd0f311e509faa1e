use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{MealResponse, NutritionItem, SearchQuery, SelectedIngredient};
use super::source::CalculatorError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/calculator/search", get(search))
        .route("/calculator/meal", get(get_meal).post(add_ingredient))
        .route("/calculator/meal/:id", delete(remove_ingredient))
}

fn calculator_status(e: &CalculatorError) -> StatusCode {
    match e {
        CalculatorError::InvalidQuery => StatusCode::BAD_REQUEST,
        CalculatorError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        CalculatorError::SearchFailed(_) => StatusCode::BAD_GATEWAY,
    }
}

#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<NutritionItem>>, (StatusCode, String)> {
    let items = state
        .nutrition
        .search(&q.query)
        .await
        .map_err(|e| {
            warn!(code = e.code(), error = %e, "nutrition search failed");
            (calculator_status(&e), e.to_string())
        })?;
    info!(results = items.len(), "nutrition search");
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn get_meal(State(state): State<AppState>) -> Json<MealResponse> {
    let meal = state.meal.lock().await;
    Json(MealResponse {
        ingredients: meal.ingredients().to_vec(),
        totals: meal.totals(),
    })
}

#[instrument(skip(state, item))]
pub async fn add_ingredient(
    State(state): State<AppState>,
    Json(item): Json<NutritionItem>,
) -> Result<(StatusCode, Json<SelectedIngredient>), (StatusCode, String)> {
    if item.name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "name is required".into()));
    }
    let selected = state.meal.lock().await.add(item);
    info!(id = %selected.id, name = %selected.item.name, "ingredient added");
    Ok((StatusCode::CREATED, Json(selected)))
}

#[instrument(skip(state))]
pub async fn remove_ingredient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.meal.lock().await.remove(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Ingredient not found".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn add_list_remove_ingredient() {
        let (state, _rx) = AppState::fake().await;
        let app = routes().with_state(state);

        let req = Request::builder()
            .method("POST")
            .uri("/calculator/meal")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"egg","calories":78,"protein_g":6.3}"#))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        let added: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let id = added["id"].as_str().unwrap().to_string();

        let req = Request::builder().uri("/calculator/meal").body(Body::empty()).unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        let meal: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(meal["totals"]["calories"], 78.0);
        assert_eq!(meal["ingredients"][0]["name"], "egg");

        let req = Request::builder()
            .method("DELETE")
            .uri(format!("/calculator/meal/{id}"))
            .body(Body::empty())
            .unwrap();
        assert_eq!(app.clone().oneshot(req).await.unwrap().status(), StatusCode::NO_CONTENT);

        let req = Request::builder()
            .method("DELETE")
            .uri(format!("/calculator/meal/{id}"))
            .body(Body::empty())
            .unwrap();
        assert_eq!(app.oneshot(req).await.unwrap().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn search_without_key_is_unavailable() {
        let (state, _rx) = AppState::fake().await;
        let app = routes().with_state(state);
        let req = Request::builder()
            .uri("/calculator/search?query=apple")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
