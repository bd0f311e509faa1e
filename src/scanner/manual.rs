use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::trace;

use super::camera::{CameraBackend, CameraDevice, CameraError, DecodeSignal, DecodeStream};

const MANUAL_DEVICE_ID: &str = "manual-0";
const INJECT_BUFFER: usize = 16;

/// A single virtual camera whose "frames" are barcodes pushed through
/// [`ManualCamera::inject`]. Only one session may hold it at a time.
#[derive(Clone)]
pub struct ManualCamera {
    tx: mpsc::Sender<String>,
    rx: Arc<Mutex<mpsc::Receiver<String>>>,
    in_use: Arc<AtomicBool>,
    frame_interval: Duration,
}

impl ManualCamera {
    pub fn new(frame_interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel(INJECT_BUFFER);
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
            in_use: Arc::new(AtomicBool::new(false)),
            frame_interval,
        }
    }

    /// Queues a barcode for the next decode attempt.
    pub fn inject(&self, barcode: impl Into<String>) -> Result<(), CameraError> {
        self.tx
            .try_send(barcode.into())
            .map_err(|e| CameraError::Device(format!("decoder queue unavailable: {e}")))
    }

    pub fn in_use(&self) -> bool {
        self.in_use.load(Ordering::SeqCst)
    }

    fn device() -> CameraDevice {
        CameraDevice {
            id: MANUAL_DEVICE_ID.into(),
            label: "Manual entry".into(),
        }
    }
}

#[async_trait]
impl CameraBackend for ManualCamera {
    async fn list_devices(&self) -> Result<Vec<CameraDevice>, CameraError> {
        Ok(vec![Self::device()])
    }

    async fn open(&self, device: &CameraDevice) -> Result<Box<dyn DecodeStream>, CameraError> {
        if device.id != MANUAL_DEVICE_ID {
            return Err(CameraError::Device(format!("unknown device {}", device.id)));
        }
        if self
            .in_use
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CameraError::Device("device busy".into()));
        }
        // stale barcodes from a previous session must not decode instantly
        {
            let mut rx = self.rx.lock().await;
            while rx.try_recv().is_ok() {}
        }
        Ok(Box::new(ManualStream {
            rx: self.rx.clone(),
            in_use: self.in_use.clone(),
            frame_interval: self.frame_interval,
        }))
    }
}

struct ManualStream {
    rx: Arc<Mutex<mpsc::Receiver<String>>>,
    in_use: Arc<AtomicBool>,
    frame_interval: Duration,
}

#[async_trait]
impl DecodeStream for ManualStream {
    async fn next_signal(&mut self) -> DecodeSignal {
        let mut rx = self.rx.lock().await;
        match tokio::time::timeout(self.frame_interval, rx.recv()).await {
            Ok(Some(code)) => DecodeSignal::Decoded(code),
            Ok(None) => DecodeSignal::Failure("decoder input closed".into()),
            Err(_) => {
                trace!("no barcode in frame");
                DecodeSignal::NotFound
            }
        }
    }
}

impl Drop for ManualStream {
    fn drop(&mut self) {
        self.in_use.store(false, Ordering::SeqCst);
    }
}

/// A host without any camera attached.
pub struct NoCamera;

#[async_trait]
impl CameraBackend for NoCamera {
    async fn list_devices(&self) -> Result<Vec<CameraDevice>, CameraError> {
        Ok(Vec::new())
    }

    async fn open(&self, device: &CameraDevice) -> Result<Box<dyn DecodeStream>, CameraError> {
        Err(CameraError::Device(format!("unknown device {}", device.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_open_is_refused_until_stream_dropped() {
        let camera = ManualCamera::new(Duration::from_millis(10));
        let device = camera.list_devices().await.unwrap().remove(0);

        let stream = camera.open(&device).await.unwrap();
        assert!(camera.in_use());
        assert_eq!(
            camera.open(&device).await.err(),
            Some(CameraError::Device("device busy".into()))
        );

        drop(stream);
        assert!(!camera.in_use());
        assert!(camera.open(&device).await.is_ok());
    }

    #[tokio::test]
    async fn injected_barcode_decodes_and_idle_frames_miss() {
        let camera = ManualCamera::new(Duration::from_millis(10));
        let device = camera.list_devices().await.unwrap().remove(0);
        let mut stream = camera.open(&device).await.unwrap();

        assert_eq!(stream.next_signal().await, DecodeSignal::NotFound);
        camera.inject("4006381333931").unwrap();
        assert_eq!(
            stream.next_signal().await,
            DecodeSignal::Decoded("4006381333931".into())
        );
    }
}
