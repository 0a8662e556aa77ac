//! Read caching in front of a backing [`Storage`].

use crate::error::StorageResult;
use crate::store::Storage;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheStrategy {
    /// Every read hits the backing store
    #[default]
    NoCache,
    /// Once populated, reads are served from memory
    Cache,
    /// Reads hit the backing store and fall back to the last good value
    CacheOnFailure,
}

/// Wraps a store with a [`CacheStrategy`].
pub struct Cached<S> {
    inner: S,
    strategy: CacheStrategy,
    /// `Some(None)` caches "nothing stored".
    cached: Mutex<Option<Option<String>>>,
}

impl<S: Storage> Cached<S> {
    pub fn new(inner: S, strategy: CacheStrategy) -> Self {
        Self {
            inner,
            strategy,
            cached: Mutex::new(None),
        }
    }

    pub fn strategy(&self) -> CacheStrategy {
        self.strategy
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn remember(&self, item: Option<String>) {
        if self.strategy != CacheStrategy::NoCache {
            *self.cached.lock() = Some(item);
        }
    }
}

#[async_trait]
impl<S: Storage> Storage for Cached<S> {
    async fn save(&self, item: String) -> StorageResult<()> {
        self.inner.save(item.clone()).await?;
        self.remember(Some(item));
        Ok(())
    }

    async fn get(&self) -> StorageResult<Option<String>> {
        if self.strategy == CacheStrategy::Cache {
            let cached = self.cached.lock().clone();
            if let Some(item) = cached {
                return Ok(item);
            }
        }
        match self.inner.get().await {
            Ok(item) => {
                self.remember(item.clone());
                Ok(item)
            }
            Err(e) if self.strategy == CacheStrategy::CacheOnFailure => {
                let Some(item) = self.cached.lock().clone() else {
                    return Err(e);
                };
                tracing::warn!(error = %e, "Storage read failed, serving cached item");
                Ok(item)
            }
            Err(e) => Err(e),
        }
    }

    async fn delete(&self) -> StorageResult<()> {
        self.inner.delete().await?;
        self.remember(None);
        Ok(())
    }
}
