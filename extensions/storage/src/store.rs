//! Backing stores holding one serialized item.

use crate::error::StorageResult;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// A slot for a single serialized item.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    async fn save(&self, item: String) -> StorageResult<()>;

    /// `Ok(None)` when nothing has been saved.
    async fn get(&self) -> StorageResult<Option<String>>;

    /// Removing an empty slot succeeds.
    async fn delete(&self) -> StorageResult<()>;
}

/// Process-local storage, gone when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    item: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn save(&self, item: String) -> StorageResult<()> {
        *self.item.lock() = Some(item);
        Ok(())
    }

    async fn get(&self) -> StorageResult<Option<String>> {
        Ok(self.item.lock().clone())
    }

    async fn delete(&self) -> StorageResult<()> {
        self.item.lock().take();
        Ok(())
    }
}

/// One file per item under `{base}/datastore/{file_name}`.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// reader never sees a half-written item.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(base: impl AsRef<Path>, file_name: &str) -> Self {
        Self {
            path: base.as_ref().join("datastore").join(file_name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `{file}.tmp` next to the target, so `prefs.json` and `prefs.txt` never share one.
    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn save(&self, item: String) -> StorageResult<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let staging = self.staging_path();
        tokio::fs::write(&staging, item).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }

    async fn get(&self) -> StorageResult<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(item) => Ok(Some(item)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self) -> StorageResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
