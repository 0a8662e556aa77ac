use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use crate::typed::TypedStorage;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::path::PathBuf;

pub type Item = Map<String, Value>;

/// Configurable single-item store for a JSON object.
///
/// Mirrors the bridge surface: `configure`, `save`, `get`, `delete`.
/// Reconfiguring swaps the backing store; the old one is not migrated.
pub struct StorageClient {
    base: PathBuf,
    storage: RwLock<Option<TypedStorage<Item>>>,
}

impl StorageClient {
    /// File-backed stores are created under `base`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            storage: RwLock::new(None),
        }
    }

    pub fn configure(&self, config: &StorageConfig) -> StorageResult<bool> {
        let storage = config.build(&self.base).inspect_err(|e| {
            tracing::error!(error = %e, "Error configuring storage");
        })?;
        *self.storage.write() = Some(TypedStorage::new(storage));
        tracing::info!(kind = ?config.kind, "Storage configured");
        Ok(true)
    }

    fn current(&self) -> StorageResult<TypedStorage<Item>> {
        self.storage.read().clone().ok_or(StorageError::NotConfigured)
    }

    pub async fn save(&self, item: &Item) -> StorageResult<bool> {
        self.current()?.save(item).await?;
        tracing::debug!(keys = item.len(), "Item saved");
        Ok(true)
    }

    pub async fn get(&self) -> StorageResult<Option<Item>> {
        let item = self.current()?.get().await?;
        tracing::debug!(found = item.is_some(), "Fetched item");
        Ok(item)
    }

    pub async fn delete(&self) -> StorageResult<bool> {
        self.current()?.delete().await?;
        tracing::debug!("Item deleted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStrategy;
    use serde_json::json;

    fn item(value: Value) -> Item {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_unconfigured_calls_fail() {
        let client = StorageClient::new(".");
        let err = client.get().await.unwrap_err();
        assert_eq!(err.code(), "NOT_CONFIGURED");
    }

    #[tokio::test]
    async fn test_datastore_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let client = StorageClient::new(dir.path());
        client
            .configure(&StorageConfig::datastore("prefs").with_cache(CacheStrategy::Cache))
            .unwrap();

        let saved = item(json!({ "username": "alice", "theme": "dark" }));
        assert!(client.save(&saved).await.unwrap());
        assert_eq!(client.get().await.unwrap(), Some(saved.clone()));

        // a fresh client sees the file written by the first
        let other = StorageClient::new(dir.path());
        other.configure(&StorageConfig::datastore("prefs")).unwrap();
        assert_eq!(other.get().await.unwrap(), Some(saved));

        assert!(other.delete().await.unwrap());
        assert_eq!(other.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reconfigure_swaps_store() {
        let client = StorageClient::new(".");
        client.configure(&StorageConfig::memory()).unwrap();
        client.save(&item(json!({ "a": 1 }))).await.unwrap();

        client.configure(&StorageConfig::memory()).unwrap();
        assert_eq!(client.get().await.unwrap(), None);
    }
}
