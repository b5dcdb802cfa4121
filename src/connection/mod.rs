//! Connection scope shared by middleware and handlers.
//!
//! # Responsibilities
//! - Expose request cookies, headers and scope kind to middleware
//! - Hold the session mapping for the lifetime of one request
//!
//! # Design Decisions
//! - The transport builds a `Connection` per request; the core never
//!   parses HTTP itself
//! - `session == None` means "no session loaded"; an empty map means
//!   "session present but cleared" — both clear cookies on store

pub mod websocket;

use std::collections::HashMap;

use http::HeaderMap;

use crate::http::parse_cookie_header;

/// The session mapping carried in the connection scope.
pub type SessionMap = serde_json::Map<String, serde_json::Value>;

/// Kind of connection scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Http,
    Websocket,
}

/// Per-request connection scope.
#[derive(Debug, Clone)]
pub struct Connection {
    kind: ScopeKind,
    path: String,
    headers: HeaderMap,
    cookies: HashMap<String, String>,
    session: Option<SessionMap>,
}

impl Connection {
    pub fn new(kind: ScopeKind, path: impl Into<String>, headers: HeaderMap) -> Self {
        let cookies = headers
            .get(http::header::COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(parse_cookie_header)
            .unwrap_or_default();
        Self {
            kind,
            path: path.into(),
            headers,
            cookies,
            session: None,
        }
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Request cookies, parsed once at construction.
    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    pub fn cookie(&self, key: &str) -> Option<&str> {
        self.cookies.get(key).map(String::as_str)
    }

    pub fn session(&self) -> Option<&SessionMap> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut SessionMap> {
        self.session.as_mut()
    }

    pub fn set_session(&mut self, session: SessionMap) {
        self.session = Some(session);
    }

    pub fn clear_session(&mut self) {
        self.session = None;
    }
}
