use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, warn};

use super::model::Product;
use super::repo_types::ProductEnvelope;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LookupError {
    #[error("barcode must not be empty")]
    InvalidBarcode,
    #[error("product {0} not found in database")]
    NotFound(String),
    #[error("failed to fetch product data: {0}")]
    Failed(String),
}

impl LookupError {
    pub fn code(&self) -> &'static str {
        match self {
            LookupError::InvalidBarcode => "invalid-barcode",
            LookupError::NotFound(_) => "product-not-found",
            LookupError::Failed(_) => "lookup-failed",
        }
    }
}

/// Where product records come from.
#[async_trait]
pub trait ProductSource: Send + Sync {
    async fn fetch(&self, barcode: &str) -> Result<Product, LookupError>;
}

/// Open food-product database, `GET {base}/api/v0/product/{barcode}.json`.
#[derive(Clone)]
pub struct OpenFoodFacts {
    client: Client,
    base: Url,
}

impl OpenFoodFacts {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base = Url::parse(base_url)?;
        anyhow::ensure!(!base.cannot_be_a_base(), "food database url cannot be a base: {base}");
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("nutriscan/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, base })
    }

    fn product_url(&self, barcode: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "v0", "product"])
                .push(&format!("{barcode}.json"));
        }
        url
    }
}

#[async_trait]
impl ProductSource for OpenFoodFacts {
    async fn fetch(&self, barcode: &str) -> Result<Product, LookupError> {
        let url = self.product_url(barcode);
        debug!(%url, "fetching product");

        let res = self.client.get(url).send().await.map_err(|e| {
            warn!(error = %e, barcode, "product request failed");
            LookupError::Failed(e.to_string())
        })?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound(barcode.to_string()));
        }
        if !status.is_success() {
            return Err(LookupError::Failed(format!("food database returned {status}")));
        }

        let body = res
            .bytes()
            .await
            .map_err(|e| LookupError::Failed(e.to_string()))?;
        let envelope: ProductEnvelope = serde_json::from_slice(&body).map_err(|e| {
            warn!(error = %e, barcode, "unparseable product response");
            LookupError::Failed(format!("invalid response: {e}"))
        })?;

        match envelope {
            ProductEnvelope { status: Some(0), .. } | ProductEnvelope { product: None, .. } => {
                Err(LookupError::NotFound(barcode.to_string()))
            }
            ProductEnvelope {
                product: Some(raw), ..
            } => Ok(Product::from_raw(barcode, raw)),
        }
    }
}
