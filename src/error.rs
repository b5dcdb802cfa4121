//! Error taxonomy and exception-to-response resolution.
//!
//! # Responsibilities
//! - Define the setup-time and request-time error types
//! - Resolve an error to a registered handler (status code first,
//!   then ordered predicate matchers, then the generic 500 fallback)
//! - Build the structured error body returned to clients
//!
//! # Design Decisions
//! - Configuration errors are fatal and never reach request handling
//! - Predicate matchers are checked in registration order; callers
//!   register the most specific matcher first
//! - Session decryption failures never surface here; the session layer
//!   degrades to an empty session instead

use std::sync::Arc;

use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Errors raised while assembling the application. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("router with path {path:?} has already been registered")]
    RouterAlreadyRegistered { path: String },

    #[error("cannot register a router on itself")]
    RouterOnItself,

    #[error("handler already registered for path {path:?} and method {method}")]
    DuplicateHandler { path: String, method: String },

    /// Internal invariant: a merge was attempted for a path that has no
    /// existing route entry. Must not happen.
    #[error("unable to find existing route index for path {path:?}")]
    MissingMergeRoute { path: String },

    #[error("route handler requires a callable target")]
    MissingHandlerFn,

    #[error("route handler requires at least one HTTP method")]
    MissingMethods,

    #[error("secret length must be 16 (128 bit), 24 (192 bit) or 32 (256 bit), got {0}")]
    InvalidSecretLength(usize),

    #[error("session cookie key must have a length between 1 and 256")]
    InvalidSessionKey,

    #[error("max_age must be greater than 0")]
    InvalidMaxAge,
}

/// A request-time error carrying an HTTP status.
#[derive(Debug, Error)]
#[error("{status}: {detail}")]
pub struct HttpError {
    pub status: StatusCode,
    pub detail: String,
    /// Arbitrary extra payload attached to the error body.
    pub extra: Option<serde_json::Value>,
}

impl HttpError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
            extra: None,
        }
    }

    pub fn with_extra(mut self, extra: serde_json::Value) -> Self {
        self.extra = Some(extra);
        self
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }
}

/// WebSocket protocol failures.
#[derive(Debug, Error)]
pub enum WsError {
    /// An operation was attempted after the connection reached the
    /// disconnected state.
    #[error("connection is disconnected")]
    Disconnected,

    /// The peer sent a disconnect event; carries the close code.
    #[error("disconnect event received (code {code})")]
    Disconnect { code: u16 },

    #[error("websocket transport error: {0}")]
    Transport(String),
}

/// Top-level error type resolved through [`ExceptionHandlers`].
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Ws(#[from] WsError),
}

impl Error {
    /// Status code carried by the error, if any. Only HTTP errors carry one.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Error::Http(err) => Some(err.status),
            _ => None,
        }
    }
}

/// Contents of the structured error response body.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorResponseContent {
    pub status_code: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl ErrorResponseContent {
    /// Build the default error body for an error without a dedicated handler.
    ///
    /// Errors without a status code map to 500.
    pub fn from_error(err: &Error) -> Self {
        let status = err
            .status_code()
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let (detail, extra) = match err {
            Error::Http(http_err) => (http_err.detail.clone(), http_err.extra.clone()),
            other => (other.to_string(), None),
        };
        Self {
            status_code: status.as_u16(),
            detail,
            extra,
        }
    }

    /// Render the error body as a JSON response.
    pub fn to_response(&self) -> crate::http::Response {
        let status = StatusCode::from_u16(self.status_code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        crate::http::Response::json(status, self)
            .unwrap_or_else(|_| crate::http::Response::new(status))
    }
}

/// Handler producing an error body from a resolved error.
pub type ExceptionHandler = Arc<dyn Fn(&Error) -> ErrorResponseContent + Send + Sync>;

/// Predicate deciding whether a matcher handles a given error.
pub type ErrorPredicate = Arc<dyn Fn(&Error) -> bool + Send + Sync>;

/// Registry mapping errors to handlers.
///
/// Resolution order: exact status-code match, then the predicate matchers
/// in registration order, then the handler registered for 500 as a
/// fallback for errors that carry no status code of their own.
#[derive(Default, Clone)]
pub struct ExceptionHandlers {
    by_status: std::collections::BTreeMap<u16, ExceptionHandler>,
    matchers: Vec<(ErrorPredicate, ExceptionHandler)>,
}

impl ExceptionHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an exact status code.
    pub fn on_status(&mut self, status: StatusCode, handler: ExceptionHandler) -> &mut Self {
        self.by_status.insert(status.as_u16(), handler);
        self
    }

    /// Register a predicate matcher. Matchers are consulted in
    /// registration order; register the most specific one first.
    pub fn on_match(&mut self, predicate: ErrorPredicate, handler: ExceptionHandler) -> &mut Self {
        self.matchers.push((predicate, handler));
        self
    }

    /// Resolve an error to a handler, if one is registered for it.
    pub fn resolve(&self, err: &Error) -> Option<&ExceptionHandler> {
        if let Some(status) = err.status_code() {
            if let Some(handler) = self.by_status.get(&status.as_u16()) {
                return Some(handler);
            }
        }
        for (predicate, handler) in &self.matchers {
            if predicate(err) {
                return Some(handler);
            }
        }
        if err.status_code().is_none() {
            return self
                .by_status
                .get(&StatusCode::INTERNAL_SERVER_ERROR.as_u16());
        }
        None
    }

    /// Produce the error body for `err`, falling back to the default
    /// representation when nothing is registered.
    pub fn response_for(&self, err: &Error) -> ErrorResponseContent {
        match self.resolve(err) {
            Some(handler) => handler(err),
            None => ErrorResponseContent::from_error(err),
        }
    }
}

impl std::fmt::Debug for ExceptionHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExceptionHandlers")
            .field("by_status", &self.by_status.keys().collect::<Vec<_>>())
            .field("matchers", &self.matchers.len())
            .finish()
    }
}
