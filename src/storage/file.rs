//! Filesystem storage backend.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use crate::storage::{Storage, StorageError, StorageObject};

/// A store keeping one envelope file per key inside a directory.
///
/// Writes go through a temporary file and a rename, so concurrent
/// writers to one key leave either the old or the new envelope, never a
/// torn one.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keys are encoded so arbitrary key strings map to safe file names.
    fn file_for(&self, key: &str) -> PathBuf {
        self.path.join(URL_SAFE_NO_PAD.encode(key.as_bytes()))
    }

    async fn read_envelope(&self, key: &str) -> Result<Option<StorageObject>, StorageError> {
        match tokio::fs::read(self.file_for(key)).await {
            Ok(raw) => Ok(Some(StorageObject::from_bytes(&raw)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_envelope(
        &self,
        key: &str,
        envelope: &StorageObject,
    ) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.path).await?;
        let target = self.file_for(key);
        let temporary = target.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&temporary, envelope.to_bytes()?).await?;
        tokio::fs::rename(&temporary, &target).await?;
        Ok(())
    }

    /// Fetch a live envelope, unlinking it when expired.
    async fn live_envelope(&self, key: &str) -> Result<Option<StorageObject>, StorageError> {
        let Some(envelope) = self.read_envelope(key).await? else {
            return Ok(None);
        };
        if envelope.expired() {
            self.delete(key).await?;
            tracing::trace!(key, "evicted expired storage entry");
            return Ok(None);
        }
        Ok(Some(envelope))
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn set(
        &self,
        key: &str,
        value: &[u8],
        expires_in: Option<Duration>,
    ) -> Result<(), StorageError> {
        let envelope = StorageObject::new(value.to_vec(), expires_in);
        self.write_envelope(key, &envelope).await
    }

    async fn get(
        &self,
        key: &str,
        renew_for: Option<Duration>,
    ) -> Result<Option<Vec<u8>>, StorageError> {
        let Some(envelope) = self.live_envelope(key).await? else {
            return Ok(None);
        };
        if let (Some(renew), Some(_)) = (renew_for, envelope.expires_at()) {
            let renewed = StorageObject::new(envelope.data().to_vec(), Some(renew));
            self.write_envelope(key, &renewed).await?;
        }
        Ok(Some(envelope.into_data()))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.file_for(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete_all(&self) -> Result<(), StorageError> {
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        tokio::fs::create_dir_all(&self.path).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.live_envelope(key).await?.is_some())
    }

    async fn expires_in(&self, key: &str) -> Result<Option<Duration>, StorageError> {
        Ok(self
            .live_envelope(key)
            .await?
            .and_then(|envelope| envelope.expires_in()))
    }
}
