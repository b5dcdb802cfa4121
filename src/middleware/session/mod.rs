//! Session middleware.
//!
//! # Data Flow
//! ```text
//! on_request:
//!     connection cookies → backend.load_from_connection → session map
//!     placed in the connection scope
//!
//! on_response:
//!     session map in scope → backend.store_in_headers → Set-Cookie
//!     headers (session chunks, or clearing cookies when empty)
//! ```
//!
//! # Design Decisions
//! - Backends are pluggable: cookie-carried (encrypted) or storage-backed
//! - Loading never fails on bad client input; only backend I/O is fallible
//! - Cookie attributes are shared config applied uniformly to every
//!   emitted session cookie

pub mod client_side;
pub mod server_side;

use async_trait::async_trait;
use http::{HeaderMap, HeaderValue};
use thiserror::Error;

use crate::connection::{Connection, SessionMap};
use crate::error::{ConfigError, HttpError};
use crate::http::{Cookie, SameSite};
use crate::middleware::Middleware;
use crate::storage::StorageError;

pub use client_side::{ClientSideSessionBackend, ClientSideSessionConfig};
pub use server_side::{ServerSideSessionBackend, ServerSideSessionConfig};

pub const ONE_DAY_IN_SECONDS: u64 = 24 * 60 * 60;

/// Failures while persisting a session. Loading bad client data is not
/// an error; it degrades to an empty session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to serialize session payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("session payload encryption failed")]
    Encrypt,

    #[error("session cookie produced an invalid header value")]
    CookieValue,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Cookie attributes shared by the session backends.
#[derive(Debug, Clone)]
pub struct SessionCookieConfig {
    /// Cookie key; chunked cookies append `-{n}`.
    pub key: String,
    /// Maximal age of the session in seconds.
    pub max_age: u64,
    pub path: String,
    pub domain: Option<String>,
    pub secure: bool,
    pub httponly: bool,
    pub samesite: SameSite,
}

impl Default for SessionCookieConfig {
    fn default() -> Self {
        Self {
            key: "session".to_string(),
            max_age: ONE_DAY_IN_SECONDS * 14,
            path: "/".to_string(),
            domain: None,
            secure: false,
            httponly: true,
            samesite: SameSite::Lax,
        }
    }
}

impl SessionCookieConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key.is_empty() || self.key.len() > 256 {
            return Err(ConfigError::InvalidSessionKey);
        }
        if self.max_age == 0 {
            return Err(ConfigError::InvalidMaxAge);
        }
        Ok(())
    }

    /// A session cookie carrying `value`, with all configured attributes.
    pub fn cookie(&self, key: impl Into<String>, value: impl Into<String>) -> Cookie {
        let mut cookie = Cookie::new(key, value)
            .with_path(self.path.clone())
            .with_samesite(self.samesite)
            .with_secure(self.secure)
            .with_httponly(self.httponly)
            .with_max_age(self.max_age);
        if let Some(domain) = &self.domain {
            cookie = cookie.with_domain(domain.clone());
        }
        cookie
    }

    /// A clearing cookie for `key`: value "null", Max-Age=0, same scope
    /// attributes so the browser matches the original cookie.
    pub fn clearing_cookie(&self, key: impl Into<String>) -> Cookie {
        let mut cookie = Cookie::clearing(key)
            .with_path(self.path.clone())
            .with_samesite(self.samesite)
            .with_secure(self.secure)
            .with_httponly(self.httponly);
        if let Some(domain) = &self.domain {
            cookie = cookie.with_domain(domain.clone());
        }
        cookie
    }
}

/// Converts the in-scope session mapping to and from its persisted or
/// cookie-carried representation.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Load the session for this connection. Malformed or tampered client
    /// data yields an empty session, never an error.
    async fn load_from_connection(
        &self,
        connection: &Connection,
    ) -> Result<SessionMap, SessionError>;

    /// Persist the session into response headers (and backend storage,
    /// where applicable). An empty or absent session clears cookies.
    async fn store_in_headers(
        &self,
        session: Option<&SessionMap>,
        headers: &mut HeaderMap,
        connection: &Connection,
    ) -> Result<(), SessionError>;
}

pub(crate) fn append_set_cookie(
    headers: &mut HeaderMap,
    cookie: &Cookie,
) -> Result<(), SessionError> {
    let value = HeaderValue::from_str(&cookie.to_header_value())
        .map_err(|_| SessionError::CookieValue)?;
    headers.append(http::header::SET_COOKIE, value);
    Ok(())
}

/// Middleware wiring a [`SessionBackend`] into the request lifecycle.
pub struct SessionMiddleware<B> {
    backend: B,
}

impl<B: SessionBackend> SessionMiddleware<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[async_trait]
impl<B: SessionBackend> Middleware for SessionMiddleware<B> {
    async fn on_request(&self, connection: &mut Connection) -> Result<(), HttpError> {
        let session = self
            .backend
            .load_from_connection(connection)
            .await
            .map_err(|err| HttpError::internal(format!("session load failed: {err}")))?;
        connection.set_session(session);
        Ok(())
    }

    async fn on_response(
        &self,
        connection: &Connection,
        headers: &mut HeaderMap,
    ) -> Result<(), HttpError> {
        self.backend
            .store_in_headers(connection.session(), headers, connection)
            .await
            .map_err(|err| HttpError::internal(format!("session store failed: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SessionCookieConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_key_is_rejected() {
        let config = SessionCookieConfig {
            key: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSessionKey)
        ));
    }

    #[test]
    fn oversized_key_is_rejected() {
        let config = SessionCookieConfig {
            key: "k".repeat(257),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSessionKey)
        ));
    }

    #[test]
    fn zero_max_age_is_rejected() {
        let config = SessionCookieConfig {
            max_age: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidMaxAge)));
    }

    #[test]
    fn clearing_cookie_drops_max_age_attribute_to_zero() {
        let config = SessionCookieConfig::default();
        let header = config.clearing_cookie("session-2").to_header_value();
        assert!(header.starts_with("session-2=null"));
        assert!(header.ends_with("Max-Age=0"));
    }
}
