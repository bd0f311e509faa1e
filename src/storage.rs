use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// Whole-value key/value persistence, one blob per key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Bytes>>;
    async fn put(&self, key: &str, body: Bytes) -> anyhow::Result<()>;
}

/// Keeps every key as `<root>/<key>.json`.
#[derive(Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub async fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create data dir {}", root.display()))?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        anyhow::ensure!(
            !key.is_empty()
                && key
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "invalid storage key {key:?}"
        );
        Ok(self.root.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Bytes>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
        }
    }

    async fn put(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        // one temp file per write so concurrent puts never share it
        let tmp = self
            .root
            .join(format!(".{key}.{}.tmp", Uuid::new_v4().simple()));
        let written = match tokio::fs::write(&tmp, &body).await {
            Ok(()) => tokio::fs::rename(&tmp, &path)
                .await
                .with_context(|| format!("rename into {}", path.display())),
            Err(e) => Err(e).with_context(|| format!("write {}", tmp.display())),
        };
        if written.is_err() {
            let _ = tokio::fs::remove_file(&tmp).await;
        }
        written?;
        debug!(key, bytes = body.len(), "document written");
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Bytes>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
        self.entries.write().await.insert(key.to_string(), body);
        Ok(())
    }
}

/// A single JSON document stored under a fixed key.
pub struct Document<T> {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Document<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key: self.key,
            _marker: PhantomData,
        }
    }
}

impl<T> Document<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            store,
            key,
            _marker: PhantomData,
        }
    }

    /// Missing, unreadable and malformed documents all load as `None`.
    pub async fn load(&self) -> Option<T> {
        let raw = match self.store.get(self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = self.key, error = %e, "document unreadable; treating as absent");
                return None;
            }
        };
        match serde_json::from_slice::<T>(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = self.key, error = %e, "malformed document; treating as absent");
                None
            }
        }
    }

    pub async fn save(&self, value: &T) -> anyhow::Result<()> {
        let body = serde_json::to_vec(value).with_context(|| format!("encode {}", self.key))?;
        self.store.put(self.key, Bytes::from(body)).await
    }
}
