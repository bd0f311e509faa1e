use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraKind {
    Manual,
    None,
}

impl std::str::FromStr for CameraKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "none" => Ok(Self::None),
            other => anyhow::bail!("unknown CAMERA_BACKEND {other:?} (expected manual or none)"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    pub kind: CameraKind,
    /// How long the decoder waits for a frame before reporting a miss.
    pub frame_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NutritionApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub food_db_base_url: String,
    pub lookup_timeout_secs: u64,
    pub nutrition: NutritionApiConfig,
    pub data_dir: PathBuf,
    pub camera: CameraConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let camera = CameraConfig {
            kind: std::env::var("CAMERA_BACKEND")
                .ok()
                .map(|v| v.parse::<CameraKind>())
                .transpose()?
                .unwrap_or(CameraKind::Manual),
            frame_ms: std::env::var("CAMERA_FRAME_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(250),
        };
        let nutrition = NutritionApiConfig {
            base_url: std::env::var("NUTRITION_API_URL")
                .unwrap_or_else(|_| "https://api.calorieninjas.com".into()),
            api_key: std::env::var("NUTRITION_API_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        };
        Ok(Self {
            food_db_base_url: std::env::var("FOOD_DB_BASE_URL")
                .unwrap_or_else(|_| "https://world.openfoodfacts.org".into()),
            lookup_timeout_secs: std::env::var("LOOKUP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(10),
            nutrition,
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            camera,
        })
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.camera.frame_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_kind_parses_case_insensitively() {
        assert_eq!("Manual".parse::<CameraKind>().unwrap(), CameraKind::Manual);
        assert_eq!(" none ".parse::<CameraKind>().unwrap(), CameraKind::None);
        let err = "webcam".parse::<CameraKind>().unwrap_err();
        assert!(err.to_string().contains("CAMERA_BACKEND"));
    }
}
