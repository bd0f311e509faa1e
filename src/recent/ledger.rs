use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::products::model::Product;

pub const MAX_RECENT_SCANS: usize = 10;

/// One row of the recent-scans list, keyed by barcode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentScanEntry {
    pub id: String,
    pub name: String,
    pub calories: u32,
    pub protein: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Epoch milliseconds of the last lookup.
    #[serde(rename = "date")]
    pub scanned_at: i64,
}

impl RecentScanEntry {
    pub fn from_product(product: &Product, scanned_at: i64) -> Self {
        Self {
            id: product.barcode.clone(),
            name: product.name.clone(),
            calories: product
                .calories_kcal()
                .map(|kcal| kcal.round().max(0.0) as u32)
                .unwrap_or(0),
            protein: product.protein_g.unwrap_or(0.0),
            image: product.image_url.clone(),
            scanned_at,
        }
    }
}

/// Most-recent-first, unique by id, at most [`MAX_RECENT_SCANS`] long.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RecentScans {
    entries: Vec<RecentScanEntry>,
}

impl RecentScans {
    /// Rebuilds the invariants from whatever was persisted.
    pub fn from_persisted(mut entries: Vec<RecentScanEntry>) -> Self {
        entries.sort_by(|a, b| b.scanned_at.cmp(&a.scanned_at));
        let mut seen = HashSet::new();
        entries.retain(|e| seen.insert(e.id.clone()));
        entries.truncate(MAX_RECENT_SCANS);
        Self { entries }
    }

    pub fn upsert(&mut self, entry: RecentScanEntry) {
        self.entries.retain(|e| e.id != entry.id);
        self.entries.insert(0, entry);
        self.entries.truncate(MAX_RECENT_SCANS);
    }

    pub fn entries(&self) -> &[RecentScanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
