//! Storage-backed session backend.
//!
//! # Responsibilities
//! - Carry only a random session id in the cookie; the payload lives in
//!   a [`Storage`] backend under that id
//! - Optionally slide the stored session's expiry on access
//! - Delete the stored payload and clear the cookie when the session
//!   empties
//!
//! # Design Decisions
//! - Ids are 32 hex characters; a cookie with any other id length is
//!   ignored and a fresh id is minted on the next store
//! - Storage failures are real errors (unlike client-data failures,
//!   which degrade to an empty session)

use std::time::Duration;

use async_trait::async_trait;
use http::HeaderMap;

use crate::connection::{Connection, SessionMap};
use crate::error::ConfigError;
use crate::middleware::session::{
    append_set_cookie, SessionBackend, SessionCookieConfig, SessionError,
};
use crate::storage::Storage;

/// Length of a session id in characters (UUID v4, hex).
pub const SESSION_ID_LENGTH: usize = 32;

/// Configuration for [`ServerSideSessionBackend`].
#[derive(Debug, Clone)]
pub struct ServerSideSessionConfig {
    /// Slide the stored session's expiry forward on every access.
    pub renew_on_access: bool,
    pub cookie: SessionCookieConfig,
}

impl Default for ServerSideSessionConfig {
    fn default() -> Self {
        Self {
            renew_on_access: false,
            cookie: SessionCookieConfig::default(),
        }
    }
}

/// Session backend persisting payloads in a storage engine.
pub struct ServerSideSessionBackend<S> {
    storage: S,
    config: ServerSideSessionConfig,
}

impl<S: Storage> ServerSideSessionBackend<S> {
    pub fn new(storage: S, config: ServerSideSessionConfig) -> Result<Self, ConfigError> {
        config.cookie.validate()?;
        Ok(Self { storage, config })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn config(&self) -> &ServerSideSessionConfig {
        &self.config
    }

    fn generate_session_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    /// The session id presented by the connection, if well-formed.
    fn session_id(&self, connection: &Connection) -> Option<String> {
        connection
            .cookie(&self.config.cookie.key)
            .filter(|id| id.len() == SESSION_ID_LENGTH)
            .map(str::to_string)
    }

    fn max_age(&self) -> Duration {
        Duration::from_secs(self.config.cookie.max_age)
    }
}

#[async_trait]
impl<S: Storage> SessionBackend for ServerSideSessionBackend<S> {
    async fn load_from_connection(
        &self,
        connection: &Connection,
    ) -> Result<SessionMap, SessionError> {
        let Some(session_id) = self.session_id(connection) else {
            return Ok(SessionMap::new());
        };
        let renew_for = self.config.renew_on_access.then(|| self.max_age());
        let Some(raw) = self.storage.get(&session_id, renew_for).await? else {
            return Ok(SessionMap::new());
        };
        // A corrupted payload degrades to an empty session.
        Ok(serde_json::from_slice(&raw).unwrap_or_default())
    }

    async fn store_in_headers(
        &self,
        session: Option<&SessionMap>,
        headers: &mut HeaderMap,
        connection: &Connection,
    ) -> Result<(), SessionError> {
        let session_id = self
            .session_id(connection)
            .unwrap_or_else(Self::generate_session_id);

        match session.filter(|session| !session.is_empty()) {
            Some(session) => {
                let payload = serde_json::to_vec(session)?;
                self.storage
                    .set(&session_id, &payload, Some(self.max_age()))
                    .await?;
                let cookie = self
                    .config
                    .cookie
                    .cookie(self.config.cookie.key.clone(), session_id);
                append_set_cookie(headers, &cookie)?;
            }
            None => {
                self.storage.delete(&session_id).await?;
                let cookie = self
                    .config
                    .cookie
                    .clearing_cookie(self.config.cookie.key.clone());
                append_set_cookie(headers, &cookie)?;
            }
        }
        Ok(())
    }
}
