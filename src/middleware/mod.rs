//! Middleware seam.
//!
//! # Data Flow
//! ```text
//! Transport builds Connection
//!     → on_request hooks (outermost first: enrich the connection scope)
//!     → route handler produces a Response
//!     → on_response hooks (reverse order: emit headers, e.g. Set-Cookie)
//!     → Transport writes the response
//! ```
//!
//! # Design Decisions
//! - Middleware operates on the connection scope and outgoing headers;
//!   wrapping the raw transport callables stays with the transport
//! - Hooks are fallible; a failed hook resolves through the exception
//!   handlers like any other request-time error

pub mod session;

use async_trait::async_trait;
use http::HeaderMap;

use crate::connection::Connection;
use crate::error::HttpError;

/// A request/response middleware.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Runs before the route handler. May enrich the connection scope.
    async fn on_request(&self, connection: &mut Connection) -> Result<(), HttpError>;

    /// Runs after the route handler. May append response headers.
    async fn on_response(
        &self,
        connection: &Connection,
        headers: &mut HeaderMap,
    ) -> Result<(), HttpError>;
}
