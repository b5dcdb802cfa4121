//! Expiring key/value storage.
//!
//! # Data Flow
//! ```text
//! set(key, value, ttl)
//!     → StorageObject (ttl converted to absolute UTC expiry)
//!     → envelope encoded (bincode) where the backend persists bytes
//!
//! get(key, renew?)
//!     → envelope decoded
//!     → expired? evict lazily, report not-found
//!     → renew? slide the expiry forward (only if one was set)
//! ```
//!
//! # Design Decisions
//! - Expiry is evaluated at read time; no background sweeper in the core
//! - Backends must tolerate concurrent callers sharing the store; the
//!   backend's per-key set/get is assumed atomic
//! - A value stored without expiry is never renewed

pub mod file;
pub mod memory;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Storage backend failures. Expired or missing keys are not errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage envelope encoding failed: {0}")]
    Codec(#[from] bincode::Error),
}

/// Thread and process safe asynchronous key/value store.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store a value. `expires_in` is converted to an absolute expiry.
    async fn set(
        &self,
        key: &str,
        value: &[u8],
        expires_in: Option<Duration>,
    ) -> Result<(), StorageError>;

    /// Fetch a value. Expired values report as missing. With `renew_for`,
    /// a hit on a value that carries an expiry slides the expiry forward;
    /// values without an expiry are never renewed.
    async fn get(
        &self,
        key: &str,
        renew_for: Option<Duration>,
    ) -> Result<Option<Vec<u8>>, StorageError>;

    /// Delete a value. Deleting a missing key is a no-op.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Delete all stored values.
    async fn delete_all(&self) -> Result<(), StorageError>;

    /// Whether a live (non-expired) value exists for `key`.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Remaining lifetime of `key`, or `None` when the key is missing or
    /// was stored without an expiry.
    async fn expires_in(&self, key: &str) -> Result<Option<Duration>, StorageError>;
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Envelope persisted by storage backends: the payload plus its optional
/// absolute expiry (UTC epoch seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageObject {
    expires_at: Option<i64>,
    data: Vec<u8>,
}

impl StorageObject {
    /// Construct an envelope, converting the relative TTL to an absolute
    /// expiry timestamp.
    pub fn new(data: Vec<u8>, expires_in: Option<Duration>) -> Self {
        Self {
            expires_at: expires_in.map(|ttl| now_secs() + ttl.as_secs() as i64),
            data,
        }
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }

    /// Expired ⇔ an expiry is set and now is at or past it.
    pub fn expired(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| now_secs() >= expires_at)
    }

    /// Remaining lifetime; `None` when stored without expiry.
    pub fn expires_in(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires_at| Duration::from_secs((expires_at - now_secs()).max(0) as u64))
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Encode the envelope for persistence.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StorageError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode an envelope previously encoded with [`StorageObject::to_bytes`].
    pub fn from_bytes(raw: &[u8]) -> Result<Self, StorageError> {
        Ok(bincode::deserialize(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_round_trips_through_bytes() {
        let object = StorageObject::new(b"payload".to_vec(), Some(Duration::from_secs(60)));
        let decoded = StorageObject::from_bytes(&object.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, object);
    }

    #[test]
    fn no_expiry_never_expires() {
        let object = StorageObject::new(b"payload".to_vec(), None);
        assert!(!object.expired());
        assert!(object.expires_in().is_none());
    }

    #[test]
    fn past_expiry_reports_expired() {
        let mut object = StorageObject::new(b"payload".to_vec(), Some(Duration::from_secs(60)));
        object.expires_at = Some(now_secs() - 1);
        assert!(object.expired());
        assert_eq!(object.expires_in(), Some(Duration::ZERO));
    }

    #[test]
    fn ttl_becomes_absolute_expiry() {
        let object = StorageObject::new(Vec::new(), Some(Duration::from_secs(120)));
        let remaining = object.expires_in().unwrap().as_secs();
        assert!((118..=120).contains(&remaining));
    }
}
