//! HTTP message types the validator operates on (C4 body ownership, section 5).
//!
//! These are deliberately thin: the core does not own a transport or a real
//! HTTP server (section 1 non-goals), so `HttpRequest`/`HttpResponse` are
//! plain structs an embedder builds from whatever server framework it uses,
//! mirroring the way this codebase's own `server::HttpRequest` /
//! `server::HttpResponse` are transport-agnostic value types handed to the
//! dispatcher rather than framework request objects.

use http::{HeaderMap, Method};
use std::io::Read;
use std::sync::{Arc, Mutex};

/// Body storage state. A body starts `Unread` (owning a boxed reader), is
/// read to completion exactly once by [`crate::body::read_body`], and from
/// then on is `Buffered` so every subsequent read — by the validator or by
/// a downstream consumer — observes the identical bytes (spec invariant 4:
/// idempotence of body rewind).
pub enum BodyCell {
    Unread(Box<dyn Read + Send>),
    Buffered(Arc<[u8]>),
}

impl BodyCell {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        BodyCell::Buffered(Arc::from(bytes.into().into_boxed_slice()))
    }

    pub fn empty() -> Self {
        BodyCell::Buffered(Arc::from(Vec::new().into_boxed_slice()))
    }
}

/// An HTTP request as seen by the validator: method, path (no query
/// string), raw query string, headers, and a body the validator reads at
/// most once (section 5: body ownership).
pub struct HttpRequest {
    pub method: Method,
    /// Path component only, e.g. `/pets/123` — no query string.
    pub path: String,
    /// Raw query string with no leading `?`, e.g. `limit=10&offset=0`.
    pub query: String,
    pub headers: HeaderMap,
    pub body: Mutex<BodyCell>,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        HttpRequest {
            method,
            path: path.into(),
            query: String::new(),
            headers: HeaderMap::new(),
            body: Mutex::new(BodyCell::empty()),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::HeaderName::try_from(name),
            http::HeaderValue::try_from(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_body(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.body = Mutex::new(BodyCell::from_bytes(bytes));
        self
    }

    /// Value of the `Cookie` header, if present, as a semicolon-separated string.
    pub fn cookie_header(&self) -> Option<&str> {
        self.headers.get(http::header::COOKIE).and_then(|v| v.to_str().ok())
    }

    /// Value of the `Content-Type` header, if present.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(http::header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

/// An HTTP response as seen by the validator: status code, headers, body.
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Mutex<BodyCell>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        HttpResponse {
            status,
            headers: HeaderMap::new(),
            body: Mutex::new(BodyCell::empty()),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::HeaderName::try_from(name),
            http::HeaderValue::try_from(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_body(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.body = Mutex::new(BodyCell::from_bytes(bytes));
        self
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(http::header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_roundtrip() {
        let req = HttpRequest::new(Method::POST, "/burgers/createBurger")
            .with_header("content-type", "application/json")
            .with_body(br#"{"name":"Big Mac"}"#.to_vec());
        assert_eq!(req.path, "/burgers/createBurger");
        assert_eq!(req.content_type(), Some("application/json"));
    }
}
