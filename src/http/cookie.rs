//! Cookie datastructure and wire format.
//!
//! # Responsibilities
//! - Render `Set-Cookie` header values
//! - Parse the request `Cookie` header into key/value pairs
//! - Provide the clearing form used to expire stale session chunks
//!
//! # Design Decisions
//! - Attribute order is fixed: Path, SameSite, Secure, HttpOnly, Domain,
//!   Max-Age
//! - Clearing a cookie sets value "null" with Max-Age=0 rather than
//!   relying on an Expires date

use std::collections::HashMap;

/// SameSite attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Lax => "lax",
            SameSite::Strict => "strict",
            SameSite::None => "none",
        }
    }
}

/// A response cookie.
#[derive(Debug, Clone, PartialEq)]
pub struct Cookie {
    pub key: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub max_age: Option<u64>,
    pub secure: bool,
    pub httponly: bool,
    pub samesite: Option<SameSite>,
}

impl Cookie {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            path: None,
            domain: None,
            max_age: None,
            secure: false,
            httponly: false,
            samesite: None,
        }
    }

    /// A cookie that expires an existing cookie with the same key.
    pub fn clearing(key: impl Into<String>) -> Self {
        let mut cookie = Self::new(key, "null");
        cookie.max_age = Some(0);
        cookie
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_httponly(mut self, httponly: bool) -> Self {
        self.httponly = httponly;
        self
    }

    pub fn with_samesite(mut self, samesite: SameSite) -> Self {
        self.samesite = Some(samesite);
        self
    }

    /// Render the `Set-Cookie` header value.
    pub fn to_header_value(&self) -> String {
        let mut header = format!("{}={}", self.key, self.value);
        if let Some(path) = &self.path {
            header.push_str("; Path=");
            header.push_str(path);
        }
        if let Some(samesite) = self.samesite {
            header.push_str("; SameSite=");
            header.push_str(samesite.as_str());
        }
        if self.secure {
            header.push_str("; Secure");
        }
        if self.httponly {
            header.push_str("; HttpOnly");
        }
        if let Some(domain) = &self.domain {
            header.push_str("; Domain=");
            header.push_str(domain);
        }
        if let Some(max_age) = self.max_age {
            header.push_str("; Max-Age=");
            header.push_str(&max_age.to_string());
        }
        header
    }
}

/// Parse a request `Cookie` header into key/value pairs.
///
/// Malformed segments are skipped; later duplicates overwrite earlier ones.
pub fn parse_cookie_header(header: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for segment in header.split(';') {
        let segment = segment.trim();
        if let Some((key, value)) = segment.split_once('=') {
            if !key.is_empty() {
                cookies.insert(key.to_string(), value.to_string());
            }
        }
    }
    cookies
}
