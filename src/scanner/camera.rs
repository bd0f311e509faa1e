//! The seam between the scanner and whatever decodes barcodes from a camera.

use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CameraDevice {
    pub id: String,
    pub label: String,
}

/// What a decoder reports for each attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeSignal {
    Decoded(String),
    /// No barcode in this frame. Not an error.
    NotFound,
    PermissionDenied,
    Failure(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("camera device error: {0}")]
    Device(String),
}

/// A live decode session bound to one device. Dropping it releases the device.
#[async_trait]
pub trait DecodeStream: Send {
    async fn next_signal(&mut self) -> DecodeSignal;
}

#[async_trait]
pub trait CameraBackend: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<CameraDevice>, CameraError>;
    async fn open(&self, device: &CameraDevice) -> Result<Box<dyn DecodeStream>, CameraError>;
}
