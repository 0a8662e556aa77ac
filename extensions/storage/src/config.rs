use crate::cache::{CacheStrategy, Cached};
use crate::error::{StorageError, StorageResult};
use crate::store::{FileStorage, MemoryStorage, Storage};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

pub const DEFAULT_FILE_NAME: &str = "secure_prefs";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Memory,
    /// File-backed JSON
    #[default]
    Datastore,
    /// Hardware-keyed encryption; not available here
    Encrypted,
}

/// Storage options as they cross the bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    #[serde(default, rename = "type")]
    pub kind: StorageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default)]
    pub cache_strategy: CacheStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strong_box_preferred: Option<bool>,
}

impl StorageConfig {
    pub fn memory() -> Self {
        Self {
            kind: StorageKind::Memory,
            ..Self::default()
        }
    }

    pub fn datastore(file_name: impl Into<String>) -> Self {
        Self {
            kind: StorageKind::Datastore,
            file_name: Some(file_name.into()),
            ..Self::default()
        }
    }

    pub fn with_cache(mut self, strategy: CacheStrategy) -> Self {
        self.cache_strategy = strategy;
        self
    }

    pub fn file_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or(DEFAULT_FILE_NAME)
    }

    /// Build the store described by this configuration. File stores live
    /// under `base`.
    pub fn build(&self, base: &Path) -> StorageResult<Arc<dyn Storage>> {
        match self.kind {
            StorageKind::Memory => {
                tracing::debug!("Using memory storage");
                Ok(Arc::new(MemoryStorage::new()))
            }
            StorageKind::Datastore => {
                let name = self.file_name();
                if name.is_empty() || name.contains(['/', '\\']) || name == ".." {
                    return Err(StorageError::Unsupported(format!(
                        "fileName must be a plain file name, got '{name}'"
                    )));
                }
                let store = FileStorage::new(base, name);
                tracing::debug!(path = %store.path().display(), cache = ?self.cache_strategy, "Using file storage");
                Ok(Arc::new(Cached::new(store, self.cache_strategy)))
            }
            StorageKind::Encrypted => Err(StorageError::Unsupported(
                "encrypted storage is not supported, use 'datastore' or 'memory'".to_string(),
            )),
        }
    }
}
