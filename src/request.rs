//! Incoming HTTP request type.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};

/// An incoming HTTP request with its body already read.
///
/// A `Request` is read-only once built, and cloning it only bumps reference
/// counts. Timing middleware relies on this: it keeps a clone for its
/// callbacks while the original moves into the handler, and both see the same
/// method, path, headers and params.
#[derive(Clone, Debug)]
pub struct Request {
    head: Arc<Head>,
    body: Bytes,
    params: Arc<HashMap<String, String>>,
}

#[derive(Debug)]
struct Head {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
}

impl Request {
    pub(crate) fn new(parts: http::request::Parts, body: Bytes) -> Self {
        Self {
            head: Arc::new(Head {
                method: parts.method,
                uri: parts.uri,
                headers: parts.headers,
            }),
            body,
            params: Arc::default(),
        }
    }

    pub(crate) fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = Arc::new(params);
        self
    }

    pub fn method(&self) -> &Method { &self.head.method }
    pub fn uri(&self) -> &Uri { &self.head.uri }
    pub fn path(&self) -> &str { self.head.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.head.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Values that are not visible ASCII
    /// read as `None`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Builds a request without a socket, e.g. to drive a [`Router`](crate::Router)
/// from tests.
impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self::new(parts, body)
    }
}
