//! Response value returned by route handlers.
//!
//! # Responsibilities
//! - Carry status, headers and body back to the transport
//! - Serialize structured bodies (JSON) for handlers and error responses
//!
//! # Design Decisions
//! - The transport owns the actual write; this is a plain value
//! - Bodies are buffered bytes; streaming stays outside the core

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::Serialize;

/// A buffered response produced by a route handler or an exception handler.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// A JSON response with `content-type: application/json`.
    pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Result<Self, serde_json::Error> {
        let mut response = Self::new(status);
        response.body = serde_json::to_vec(body)?;
        response.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Ok(response)
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_response_sets_content_type() {
        let response =
            Response::json(StatusCode::OK, &serde_json::json!({"ok": true})).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[http::header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(response.body(), br#"{"ok":true}"#);
    }
}
