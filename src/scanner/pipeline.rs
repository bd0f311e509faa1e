use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::session::{ScanOutcome, ScanResults};
use crate::products::services::lookup_and_record;
use crate::state::AppState;

/// Feeds every decoded barcode into a product lookup until `shutdown`
/// flips to true or its sender goes away.
pub async fn run(state: AppState, mut results: ScanResults, mut shutdown: watch::Receiver<bool>) {
    info!("scan pipeline started");
    loop {
        let outcome = tokio::select! {
            _ = shutdown.wait_for(|stop| *stop) => break,
            outcome = results.recv() => match outcome {
                Some(outcome) => outcome,
                None => break,
            },
        };
        match outcome {
            ScanOutcome::Decoded(barcode) => {
                // failures are already on the result view
                if let Ok(product) = lookup_and_record(&state, &barcode).await {
                    debug!(barcode, name = %product.name, "scan resolved");
                }
            }
            ScanOutcome::Failed(e) => {
                warn!(code = e.code(), error = %e, "camera session ended with error");
            }
        }
    }
    info!("scan pipeline stopped");
}
