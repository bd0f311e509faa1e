use std::sync::Arc;

use tokio::sync::Mutex;

use crate::calculator::services::MealBuilder;
use crate::calculator::source::{CalorieNinjas, NutritionSource};
use crate::config::{AppConfig, CameraKind};
use crate::products::source::{OpenFoodFacts, ProductSource};
use crate::products::view::ResultView;
use crate::profile::repo::ProfileRepo;
use crate::recent::ledger::RecentScans;
use crate::recent::repo::RecentScansRepo;
use crate::scanner::camera::CameraBackend;
use crate::scanner::manual::{ManualCamera, NoCamera};
use crate::scanner::session::{ScanResults, Scanner};
use crate::storage::{FileStore, KeyValueStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub products: Arc<dyn ProductSource>,
    pub nutrition: Arc<dyn NutritionSource>,
    pub scanner: Arc<Scanner>,
    /// Set when the camera backend is the manual one.
    pub manual_camera: Option<ManualCamera>,
    pub recent: Arc<Mutex<RecentScans>>,
    pub recent_repo: RecentScansRepo,
    pub profiles: ProfileRepo,
    pub result: Arc<Mutex<ResultView>>,
    pub meal: Arc<Mutex<MealBuilder>>,
    /// Held for the duration of a product lookup.
    pub lookup_gate: Arc<Mutex<()>>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<(Self, ScanResults)> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = Arc::new(FileStore::new(&config.data_dir).await?) as Arc<dyn KeyValueStore>;
        let products = Arc::new(OpenFoodFacts::new(
            &config.food_db_base_url,
            config.lookup_timeout(),
        )?) as Arc<dyn ProductSource>;
        let nutrition = Arc::new(CalorieNinjas::new(
            &config.nutrition.base_url,
            config.nutrition.api_key.clone(),
            config.lookup_timeout(),
        )?) as Arc<dyn NutritionSource>;

        let manual_camera = match config.camera.kind {
            CameraKind::Manual => Some(ManualCamera::new(config.frame_interval())),
            CameraKind::None => None,
        };

        Ok(Self::from_parts(config, store, products, nutrition, manual_camera).await)
    }

    pub async fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn KeyValueStore>,
        products: Arc<dyn ProductSource>,
        nutrition: Arc<dyn NutritionSource>,
        manual_camera: Option<ManualCamera>,
    ) -> (Self, ScanResults) {
        let backend: Arc<dyn CameraBackend> = match &manual_camera {
            Some(camera) => Arc::new(camera.clone()),
            None => Arc::new(NoCamera),
        };
        let (scanner, results) = Scanner::new(backend);

        let recent_repo = RecentScansRepo::new(store.clone());
        let recent = recent_repo.load().await;

        let state = Self {
            config,
            products,
            nutrition,
            scanner: Arc::new(scanner),
            manual_camera,
            recent: Arc::new(Mutex::new(recent)),
            recent_repo,
            profiles: ProfileRepo::new(store),
            result: Arc::new(Mutex::new(ResultView::default())),
            meal: Arc::new(Mutex::new(MealBuilder::default())),
            lookup_gate: Arc::new(Mutex::new(())),
        };
        (state, results)
    }

    /// In-memory state with a canned product source. Barcodes starting with
    /// `0000` are unknown, `fail` simulates an upstream outage.
    #[cfg(test)]
    pub async fn fake() -> (Self, ScanResults) {
        use crate::config::{CameraConfig, NutritionApiConfig};
        use crate::products::model::Product;
        use crate::products::repo_types::{RawNutriments, RawProduct};
        use crate::products::services::DEMO_BARCODE;
        use crate::products::source::LookupError;
        use crate::storage::MemoryStore;
        use async_trait::async_trait;
        use std::time::Duration;

        struct CannedProducts;

        #[async_trait]
        impl ProductSource for CannedProducts {
            async fn fetch(&self, barcode: &str) -> Result<Product, LookupError> {
                if barcode.starts_with("0000") {
                    return Err(LookupError::NotFound(barcode.to_string()));
                }
                if barcode == "fail" {
                    return Err(LookupError::Failed("upstream unavailable".into()));
                }
                let name = if barcode == DEMO_BARCODE {
                    "Oreo".to_string()
                } else {
                    format!("Product {barcode}")
                };
                Ok(Product::from_raw(
                    barcode,
                    RawProduct {
                        product_name: Some(name),
                        nutriments: Some(RawNutriments {
                            energy: Some(1850.0),
                            proteins: Some(12.0),
                            ..Default::default()
                        }),
                        ..Default::default()
                    },
                ))
            }
        }

        let config = Arc::new(AppConfig {
            food_db_base_url: "http://127.0.0.1:1".into(),
            lookup_timeout_secs: 1,
            nutrition: NutritionApiConfig {
                base_url: "http://127.0.0.1:1".into(),
                api_key: None,
            },
            data_dir: "./unused".into(),
            camera: CameraConfig {
                kind: CameraKind::Manual,
                frame_ms: 10,
            },
        });
        let nutrition = Arc::new(
            CalorieNinjas::new(&config.nutrition.base_url, None, Duration::from_secs(1))
                .expect("static url parses"),
        );
        Self::from_parts(
            config.clone(),
            Arc::new(MemoryStore::new()),
            Arc::new(CannedProducts),
            nutrition,
            Some(ManualCamera::new(config.frame_interval())),
        )
        .await
    }
}
