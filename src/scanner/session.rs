//! Camera acquisition as an explicit state machine:
//! `Idle -> Opening -> Scanning -> {Decoded | Errored}`.

use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::camera::{CameraBackend, CameraError, DecodeSignal, DecodeStream};

pub const RETRY_DELAY: Duration = Duration::from_millis(500);
const RESULT_BUFFER: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("No camera found. Please check your device.")]
    NoCamera,
    #[error("Camera access was denied. Please enable camera permissions.")]
    PermissionDenied,
    #[error("Barcode scanning failed: {0}")]
    DecodeFailure(String),
}

impl ScanError {
    pub fn code(&self) -> &'static str {
        match self {
            ScanError::NoCamera => "no-camera",
            ScanError::PermissionDenied => "permission-denied",
            ScanError::DecodeFailure(_) => "decode-failure",
        }
    }
}

impl From<CameraError> for ScanError {
    fn from(e: CameraError) -> Self {
        match e {
            CameraError::PermissionDenied => ScanError::PermissionDenied,
            CameraError::Device(reason) => ScanError::DecodeFailure(reason),
        }
    }
}

/// Terminal result of one camera session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Decoded(String),
    Failed(ScanError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ScannerState {
    Idle,
    Opening,
    Scanning,
    Decoded {
        barcode: String,
    },
    Errored {
        code: &'static str,
        message: String,
    },
}

impl ScannerState {
    fn from_outcome(outcome: &ScanOutcome) -> Self {
        match outcome {
            ScanOutcome::Decoded(barcode) => ScannerState::Decoded {
                barcode: barcode.clone(),
            },
            ScanOutcome::Failed(e) => ScannerState::Errored {
                code: e.code(),
                message: e.to_string(),
            },
        }
    }
}

struct Inner {
    state: ScannerState,
    /// Bumped by every open and close so a finished task from an older
    /// session cannot overwrite the current state.
    session: u64,
    task: Option<JoinHandle<()>>,
}

/// Receiving end for terminal session outcomes.
pub type ScanResults = mpsc::Receiver<ScanOutcome>;

/// Owns at most one camera session at a time.
pub struct Scanner {
    backend: Arc<dyn CameraBackend>,
    inner: Arc<StdMutex<Inner>>,
    /// Serialises open/close/retry so sessions never overlap.
    ops: Mutex<()>,
    results: mpsc::Sender<ScanOutcome>,
    retry_delay: Duration,
}

fn lock(inner: &StdMutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Scanner {
    pub fn new(backend: Arc<dyn CameraBackend>) -> (Self, ScanResults) {
        let (results, rx) = mpsc::channel(RESULT_BUFFER);
        let scanner = Self {
            backend,
            inner: Arc::new(StdMutex::new(Inner {
                state: ScannerState::Idle,
                session: 0,
                task: None,
            })),
            ops: Mutex::new(()),
            results,
            retry_delay: RETRY_DELAY,
        };
        (scanner, rx)
    }

    pub fn state(&self) -> ScannerState {
        lock(&self.inner).state.clone()
    }

    /// Starts a fresh session, closing any running one first.
    pub async fn open(&self) -> ScannerState {
        let _op = self.ops.lock().await;
        self.close_session().await;
        self.open_session().await
    }

    /// Stops decoding and releases the camera. Safe to call repeatedly.
    pub async fn close(&self) -> ScannerState {
        let _op = self.ops.lock().await;
        self.close_session().await;
        self.state()
    }

    /// Close, wait [`RETRY_DELAY`], open again.
    pub async fn retry(&self) -> ScannerState {
        let _op = self.ops.lock().await;
        self.close_session().await;
        tokio::time::sleep(self.retry_delay).await;
        self.open_session().await
    }

    async fn close_session(&self) {
        let task = {
            let mut inner = lock(&self.inner);
            inner.session += 1;
            inner.state = ScannerState::Idle;
            inner.task.take()
        };
        if let Some(task) = task {
            task.abort();
            // the stream is dropped once the aborted task is joined
            let _ = task.await;
            debug!("camera session closed");
        }
    }

    async fn open_session(&self) -> ScannerState {
        let session = {
            let mut inner = lock(&self.inner);
            inner.session += 1;
            inner.state = ScannerState::Opening;
            inner.session
        };
        info!(session, "opening camera");

        let devices = match self.backend.list_devices().await {
            Ok(devices) => devices,
            Err(e) => return self.fail(session, e.into()),
        };
        let Some(device) = devices.into_iter().next() else {
            return self.fail(session, ScanError::NoCamera);
        };
        let stream = match self.backend.open(&device).await {
            Ok(stream) => stream,
            Err(e) => return self.fail(session, e.into()),
        };

        let mut inner = lock(&self.inner);
        if inner.session != session {
            return inner.state.clone();
        }
        inner.state = ScannerState::Scanning;
        inner.task = Some(tokio::spawn(decode_loop(
            stream,
            session,
            self.inner.clone(),
            self.results.clone(),
        )));
        info!(session, device = %device.label, "scanning");
        inner.state.clone()
    }

    fn fail(&self, session: u64, error: ScanError) -> ScannerState {
        warn!(session, code = error.code(), error = %error, "camera session failed");
        let mut inner = lock(&self.inner);
        if inner.session == session {
            inner.state = ScannerState::from_outcome(&ScanOutcome::Failed(error));
        }
        inner.state.clone()
    }
}

impl Drop for Scanner {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.inner).task.take() {
            task.abort();
        }
    }
}

async fn decode_loop(
    mut stream: Box<dyn DecodeStream>,
    session: u64,
    inner: Arc<StdMutex<Inner>>,
    results: mpsc::Sender<ScanOutcome>,
) {
    let outcome = loop {
        match stream.next_signal().await {
            DecodeSignal::Decoded(code) => break ScanOutcome::Decoded(code),
            DecodeSignal::NotFound => continue,
            DecodeSignal::PermissionDenied => break ScanOutcome::Failed(ScanError::PermissionDenied),
            DecodeSignal::Failure(reason) => {
                break ScanOutcome::Failed(ScanError::DecodeFailure(reason))
            }
        }
    };
    // release the camera before anyone hears about the result
    drop(stream);

    {
        let mut inner = lock(&inner);
        if inner.session != session {
            return;
        }
        inner.state = ScannerState::from_outcome(&outcome);
        inner.task = None;
    }
    match &outcome {
        ScanOutcome::Decoded(code) => info!(session, barcode = %code, "barcode decoded"),
        ScanOutcome::Failed(e) => warn!(session, code = e.code(), error = %e, "decoding stopped"),
    }
    let _ = results.send(outcome).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::camera::CameraDevice;
    use crate::scanner::manual::{ManualCamera, NoCamera};
    use async_trait::async_trait;

    fn manual() -> (ManualCamera, Scanner, ScanResults) {
        let camera = ManualCamera::new(Duration::from_millis(10));
        let (scanner, rx) = Scanner::new(Arc::new(camera.clone()));
        (camera, scanner, rx)
    }

    /// Opens fine, then reports one scripted signal after a few misses.
    struct Scripted(DecodeSignal);

    struct ScriptedStream {
        misses: u8,
        signal: DecodeSignal,
    }

    #[async_trait]
    impl DecodeStream for ScriptedStream {
        async fn next_signal(&mut self) -> DecodeSignal {
            tokio::task::yield_now().await;
            if self.misses > 0 {
                self.misses -= 1;
                return DecodeSignal::NotFound;
            }
            self.signal.clone()
        }
    }

    #[async_trait]
    impl CameraBackend for Scripted {
        async fn list_devices(&self) -> Result<Vec<CameraDevice>, CameraError> {
            Ok(vec![CameraDevice {
                id: "scripted".into(),
                label: "Scripted".into(),
            }])
        }

        async fn open(&self, _device: &CameraDevice) -> Result<Box<dyn DecodeStream>, CameraError> {
            Ok(Box::new(ScriptedStream {
                misses: 3,
                signal: self.0.clone(),
            }))
        }
    }

    struct Denied;

    #[async_trait]
    impl CameraBackend for Denied {
        async fn list_devices(&self) -> Result<Vec<CameraDevice>, CameraError> {
            Err(CameraError::PermissionDenied)
        }

        async fn open(&self, _device: &CameraDevice) -> Result<Box<dyn DecodeStream>, CameraError> {
            Err(CameraError::PermissionDenied)
        }
    }

    /// First open fails with a device error, later opens go to the manual camera.
    struct FlakyOnce {
        camera: ManualCamera,
        failed: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl CameraBackend for FlakyOnce {
        async fn list_devices(&self) -> Result<Vec<CameraDevice>, CameraError> {
            self.camera.list_devices().await
        }

        async fn open(&self, device: &CameraDevice) -> Result<Box<dyn DecodeStream>, CameraError> {
            if !self.failed.swap(true, std::sync::atomic::Ordering::SeqCst) {
                return Err(CameraError::Device("could not start video source".into()));
            }
            self.camera.open(device).await
        }
    }

    #[tokio::test]
    async fn decode_emits_one_result_and_releases_camera() {
        let (camera, scanner, mut rx) = manual();
        assert_eq!(scanner.open().await, ScannerState::Scanning);
        assert!(camera.in_use());

        camera.inject("5449000000996").unwrap();
        assert_eq!(
            rx.recv().await,
            Some(ScanOutcome::Decoded("5449000000996".into()))
        );
        assert_eq!(
            scanner.state(),
            ScannerState::Decoded {
                barcode: "5449000000996".into()
            }
        );
        assert!(!camera.in_use());
    }

    #[tokio::test]
    async fn close_while_scanning_releases_device_for_reopen() {
        let (camera, scanner, _rx) = manual();
        scanner.open().await;
        assert!(camera.in_use());

        assert_eq!(scanner.close().await, ScannerState::Idle);
        assert!(!camera.in_use());
        assert_eq!(scanner.close().await, ScannerState::Idle);

        assert_eq!(scanner.open().await, ScannerState::Scanning);
    }

    #[tokio::test]
    async fn open_while_scanning_replaces_session() {
        let (camera, scanner, _rx) = manual();
        scanner.open().await;
        assert_eq!(scanner.open().await, ScannerState::Scanning);
        assert!(camera.in_use());
    }

    #[tokio::test]
    async fn no_devices_is_no_camera() {
        let (scanner, _rx) = Scanner::new(Arc::new(NoCamera));
        let state = scanner.open().await;
        assert_eq!(
            state,
            ScannerState::Errored {
                code: "no-camera",
                message: ScanError::NoCamera.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn permission_denied_surfaces_and_retry_reopens() {
        let (scanner, _rx) = Scanner::new(Arc::new(Denied));
        let state = scanner.open().await;
        assert!(matches!(state, ScannerState::Errored { code: "permission-denied", .. }));

        let started = tokio::time::Instant::now();
        let state = scanner.retry().await;
        assert!(started.elapsed() >= RETRY_DELAY);
        assert!(matches!(state, ScannerState::Errored { code: "permission-denied", .. }));
    }

    #[tokio::test]
    async fn retry_recovers_from_transient_device_error() {
        let camera = ManualCamera::new(Duration::from_millis(10));
        let backend = FlakyOnce {
            camera: camera.clone(),
            failed: std::sync::atomic::AtomicBool::new(false),
        };
        let (scanner, mut rx) = Scanner::new(Arc::new(backend));

        assert!(matches!(
            scanner.open().await,
            ScannerState::Errored { code: "decode-failure", .. }
        ));
        assert!(!camera.in_use());

        assert_eq!(scanner.retry().await, ScannerState::Scanning);
        camera.inject("4006381333931").unwrap();
        assert_eq!(
            rx.recv().await,
            Some(ScanOutcome::Decoded("4006381333931".into()))
        );
        assert_eq!(
            scanner.state(),
            ScannerState::Decoded {
                barcode: "4006381333931".into()
            }
        );
    }

    #[tokio::test]
    async fn decoder_failure_ends_session_after_misses() {
        let backend = Scripted(DecodeSignal::Failure("sensor glitch".into()));
        let (scanner, mut rx) = Scanner::new(Arc::new(backend));
        scanner.open().await;

        assert_eq!(
            rx.recv().await,
            Some(ScanOutcome::Failed(ScanError::DecodeFailure("sensor glitch".into())))
        );
        assert!(matches!(scanner.state(), ScannerState::Errored { code: "decode-failure", .. }));
    }

    #[tokio::test]
    async fn scripted_decode_after_misses() {
        let backend = Scripted(DecodeSignal::Decoded("123".into()));
        let (scanner, mut rx) = Scanner::new(Arc::new(backend));
        scanner.open().await;
        assert_eq!(rx.recv().await, Some(ScanOutcome::Decoded("123".into())));
    }
}
