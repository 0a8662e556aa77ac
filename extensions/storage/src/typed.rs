use crate::error::StorageResult;
use crate::store::Storage;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;

/// A [`Storage`] that stores `T` as JSON.
pub struct TypedStorage<T> {
    inner: Arc<dyn Storage>,
    _item: PhantomData<fn() -> T>,
}

impl<T> Clone for TypedStorage<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _item: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> TypedStorage<T> {
    pub fn new(inner: Arc<dyn Storage>) -> Self {
        Self {
            inner,
            _item: PhantomData,
        }
    }

    pub async fn save(&self, item: &T) -> StorageResult<()> {
        let json = serde_json::to_string(item)?;
        self.inner.save(json).await
    }

    pub async fn get(&self) -> StorageResult<Option<T>> {
        match self.inner.get().await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub async fn delete(&self) -> StorageResult<()> {
        self.inner.delete().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Prefs {
        username: String,
        remember: bool,
    }

    #[tokio::test]
    async fn test_typed_round_trip() {
        let storage = TypedStorage::<Prefs>::new(Arc::new(MemoryStorage::new()));
        assert_eq!(storage.get().await.unwrap(), None);

        let prefs = Prefs {
            username: "alice".into(),
            remember: true,
        };
        storage.save(&prefs).await.unwrap();
        assert_eq!(storage.get().await.unwrap(), Some(prefs));
    }

    #[tokio::test]
    async fn test_corrupt_item_is_an_error() {
        let raw = Arc::new(MemoryStorage::new());
        raw.save("{not json".into()).await.unwrap();
        let storage = TypedStorage::<Prefs>::new(raw);
        let err = storage.get().await.unwrap_err();
        assert_eq!(err.code(), "SERIALIZATION_ERROR");
    }
}
