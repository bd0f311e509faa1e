use std::sync::Arc;

use tracing::debug;

use super::ledger::{RecentScanEntry, RecentScans};
use crate::storage::{Document, KeyValueStore};

pub const RECENT_SCANS_KEY: &str = "recentScans";

#[derive(Clone)]
pub struct RecentScansRepo {
    doc: Document<Vec<RecentScanEntry>>,
}

impl RecentScansRepo {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            doc: Document::new(store, RECENT_SCANS_KEY),
        }
    }

    /// Absent or malformed state starts an empty ledger.
    pub async fn load(&self) -> RecentScans {
        let ledger = RecentScans::from_persisted(self.doc.load().await.unwrap_or_default());
        debug!(entries = ledger.len(), "recent scans loaded");
        ledger
    }

    pub async fn save(&self, ledger: &RecentScans) -> anyhow::Result<()> {
        self.doc.save(&ledger.entries().to_vec()).await
    }
}
