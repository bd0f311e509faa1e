use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, warn};

use super::dto::{NutritionItem, SearchResponse};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalculatorError {
    #[error("search query must not be empty")]
    InvalidQuery,
    #[error("nutrition search is not configured")]
    NotConfigured,
    #[error("Failed to fetch nutrition data: {0}")]
    SearchFailed(String),
}

impl CalculatorError {
    pub fn code(&self) -> &'static str {
        match self {
            CalculatorError::InvalidQuery => "invalid-query",
            CalculatorError::NotConfigured => "not-configured",
            CalculatorError::SearchFailed(_) => "search-failed",
        }
    }
}

#[async_trait]
pub trait NutritionSource: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<NutritionItem>, CalculatorError>;
}

/// Nutrition-facts search, `GET {base}/v1/nutrition?query=` with `X-Api-Key`.
#[derive(Clone)]
pub struct CalorieNinjas {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl CalorieNinjas {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let endpoint = Url::parse(base_url)?.join("/v1/nutrition")?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl NutritionSource for CalorieNinjas {
    async fn search(&self, query: &str) -> Result<Vec<NutritionItem>, CalculatorError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CalculatorError::InvalidQuery);
        }
        let Some(key) = self.api_key.as_deref() else {
            return Err(CalculatorError::NotConfigured);
        };
        debug!(query, "nutrition search");

        let res = self
            .client
            .get(self.endpoint.clone())
            .query(&[("query", query)])
            .header("X-Api-Key", key)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!(error = %e, "nutrition search failed");
                CalculatorError::SearchFailed(e.to_string())
            })?;
        let body: SearchResponse = res
            .json()
            .await
            .map_err(|e| CalculatorError::SearchFailed(e.to_string()))?;
        Ok(body.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::HeaderMap, http::StatusCode, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    async fn spawn_api() -> String {
        async fn nutrition(
            headers: HeaderMap,
            Query(q): Query<HashMap<String, String>>,
        ) -> Result<Json<serde_json::Value>, StatusCode> {
            if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some("secret") {
                return Err(StatusCode::UNAUTHORIZED);
            }
            let items = match q.get("query").map(String::as_str) {
                Some("1 apple") => json!([{"name": "apple", "calories": 96.4, "protein_g": 0.5}]),
                _ => json!([]),
            };
            Ok(Json(json!({ "items": items })))
        }
        let app = Router::new().route("/v1/nutrition", get(nutrition));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn search_sends_key_and_fills_missing_numbers() {
        let base = spawn_api().await;
        let api = CalorieNinjas::new(&base, Some("secret".into()), Duration::from_secs(5)).unwrap();

        let items = api.search(" 1 apple ").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "apple");
        assert_eq!(items[0].fat_total_g, 0.0);

        assert!(api.search("rocks").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_key_blank_query_and_missing_key() {
        let base = spawn_api().await;
        let wrong = CalorieNinjas::new(&base, Some("nope".into()), Duration::from_secs(5)).unwrap();
        assert_eq!(wrong.search("1 apple").await.unwrap_err().code(), "search-failed");
        assert_eq!(wrong.search("   ").await.unwrap_err(), CalculatorError::InvalidQuery);

        let keyless = CalorieNinjas::new(&base, None, Duration::from_secs(5)).unwrap();
        assert_eq!(keyless.search("1 apple").await.unwrap_err(), CalculatorError::NotConfigured);
    }
}
