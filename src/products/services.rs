use time::OffsetDateTime;
use tracing::{info, warn};

use super::model::Product;
use super::source::LookupError;
use crate::recent::ledger::RecentScanEntry;
use crate::state::AppState;

/// Barcode behind the "demo scan" button.
pub const DEMO_BARCODE: &str = "7622210449283";

fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Looks a barcode up, records it in the recent-scans ledger and puts it on
/// the result view. Lookups run one at a time.
pub async fn lookup_and_record(st: &AppState, barcode: &str) -> Result<Product, LookupError> {
    let _gate = st.lookup_gate.lock().await;

    let result = if barcode.trim().is_empty() {
        Err(LookupError::InvalidBarcode)
    } else {
        st.products.fetch(barcode).await
    };

    match result {
        Ok(product) => {
            record_recent(st, &product).await;
            st.result.lock().await.show(product.clone());
            info!(barcode, name = %product.name, "product looked up");
            Ok(product)
        }
        Err(e) => {
            warn!(barcode, code = e.code(), error = %e, "lookup failed");
            st.result.lock().await.fail(e.code(), e.to_string());
            Err(e)
        }
    }
}

async fn record_recent(st: &AppState, product: &Product) {
    let mut ledger = st.recent.lock().await;
    ledger.upsert(RecentScanEntry::from_product(product, now_millis()));
    if let Err(e) = st.recent_repo.save(&ledger).await {
        warn!(error = %e, "failed to persist recent scans");
    }
}
