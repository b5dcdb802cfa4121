//! In-memory storage backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::observability::metrics;
use crate::storage::{Storage, StorageError, StorageObject};

/// A concurrent in-memory store with lazy eviction.
///
/// Cloning shares the underlying map, so one store can back many
/// concurrently executing requests.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<DashMap<String, StorageObject>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, including not-yet-evicted
    /// expired ones.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Look up a live envelope, evicting it when expired.
    fn live_entry(&self, key: &str) -> Option<StorageObject> {
        let entry = self.inner.get(key).map(|entry| entry.value().clone())?;
        if entry.expired() {
            self.inner.remove(key);
            metrics::record_storage_eviction();
            return None;
        }
        Some(entry)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn set(
        &self,
        key: &str,
        value: &[u8],
        expires_in: Option<Duration>,
    ) -> Result<(), StorageError> {
        self.inner
            .insert(key.to_string(), StorageObject::new(value.to_vec(), expires_in));
        metrics::record_storage_size(self.inner.len());
        Ok(())
    }

    async fn get(
        &self,
        key: &str,
        renew_for: Option<Duration>,
    ) -> Result<Option<Vec<u8>>, StorageError> {
        let Some(entry) = self.live_entry(key) else {
            metrics::record_storage_miss();
            return Ok(None);
        };
        metrics::record_storage_hit();
        if let (Some(renew), Some(_)) = (renew_for, entry.expires_at()) {
            let renewed = StorageObject::new(entry.data().to_vec(), Some(renew));
            self.inner.insert(key.to_string(), renewed);
        }
        Ok(Some(entry.into_data()))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key);
        metrics::record_storage_size(self.inner.len());
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StorageError> {
        self.inner.clear();
        metrics::record_storage_size(0);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.live_entry(key).is_some())
    }

    async fn expires_in(&self, key: &str) -> Result<Option<Duration>, StorageError> {
        Ok(self.live_entry(key).and_then(|entry| entry.expires_in()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let storage = MemoryStorage::new();
        storage.set("foo", b"bar", None).await.unwrap();
        assert_eq!(storage.get("foo", None).await.unwrap(), Some(b"bar".to_vec()));
    }

    #[tokio::test]
    async fn missing_key_is_none_not_error() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("missing", None).await.unwrap(), None);
        assert!(!storage.exists("missing").await.unwrap());
        storage.delete("missing").await.unwrap();
    }

    #[tokio::test]
    async fn renewal_is_a_noop_without_expiry() {
        let storage = MemoryStorage::new();
        storage.set("foo", b"bar", None).await.unwrap();
        storage
            .get("foo", Some(Duration::from_secs(10)))
            .await
            .unwrap();
        assert_eq!(storage.expires_in("foo").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_all_clears_every_key() {
        let storage = MemoryStorage::new();
        storage.set("a", b"1", None).await.unwrap();
        storage.set("b", b"2", None).await.unwrap();
        storage.delete_all().await.unwrap();
        assert!(storage.is_empty());
    }
}
