//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Build a [`Response`] in your handler and return it. Middleware hands it
//! back to the server untouched.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use http_body_util::Full;

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK, no custom headers needed)
///
/// ```rust
/// use http::StatusCode;
/// use stint::Response;
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use http::{header, HeaderValue, StatusCode};
/// use stint::Response;
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header(header::LOCATION, HeaderValue::from_static("/users/42"))
///     .json(br#"{"id":42}"#.to_vec());
///
/// Response::builder().bytes(HeaderValue::from_static("application/xml"), b"<ok/>".to_vec());
/// ```
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// `200 OK` with `application/json`.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK` with `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { status: code, headers: HeaderMap::new(), body: Bytes::new() }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: HeaderMap::new(), status: StatusCode::OK }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`.
/// Terminated by a typed body method.
pub struct ResponseBuilder {
    headers: HeaderMap,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    /// Appends a header. Repeated names are kept, not replaced.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: impl Into<Bytes>) -> Response {
        self.finish(HeaderValue::from_static("application/json"), body.into())
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish(HeaderValue::from_static("text/plain; charset=utf-8"), Bytes::from(body.into()))
    }

    /// Terminate with any other content type: XML, HTML, binary, SSE.
    /// An invalid content type is rejected when the [`HeaderValue`] is built.
    pub fn bytes(self, content_type: HeaderValue, body: impl Into<Bytes>) -> Response {
        self.finish(content_type, body.into())
    }

    /// Terminate with no body (e.g. `204 No Content`, `301 Moved Permanently`).
    pub fn no_body(self) -> Response {
        Response { status: self.status, headers: self.headers, body: Bytes::new() }
    }

    fn finish(mut self, content_type: HeaderValue, body: Bytes) -> Response {
        self.headers.insert(CONTENT_TYPE, content_type);
        Response { status: self.status, headers: self.headers, body }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a status directly from a handler: `return StatusCode::NOT_FOUND`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}

#[cfg(test)]
mod tests {
    use http::header::LOCATION;

    use super::*;

    #[test]
    fn shortcuts_set_content_type() {
        let res = Response::json(br#"{"id":1}"#.to_vec());
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(res.body(), br#"{"id":1}"#);

        let res = Response::text("hello");
        assert_eq!(res.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    #[test]
    fn builder_keeps_status_and_headers() {
        let res = Response::builder()
            .status(StatusCode::CREATED)
            .header(LOCATION, HeaderValue::from_static("/users/99"))
            .json("{}");

        assert_eq!(res.status_code(), StatusCode::CREATED);
        assert_eq!(res.headers()[LOCATION], "/users/99");
        assert_eq!(res.headers()[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn bytes_takes_a_validated_content_type() {
        assert!(HeaderValue::from_str("text/plain\n").is_err());

        let content_type = HeaderValue::from_str("application/xml").unwrap();
        let res = Response::builder().bytes(content_type, "<ok/>");

        assert_eq!(res.headers()[CONTENT_TYPE], "application/xml");
        assert_eq!(res.body(), b"<ok/>");
    }

    #[test]
    fn status_only_response_has_no_body() {
        let res = StatusCode::NO_CONTENT.into_response();

        assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
        assert!(res.body().is_empty());
        assert!(res.headers().is_empty());
    }

    #[test]
    fn converts_into_hyper_response() {
        let inner = Response::builder()
            .status(StatusCode::ACCEPTED)
            .text("queued")
            .into_inner();

        assert_eq!(inner.status(), StatusCode::ACCEPTED);
        assert_eq!(inner.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
    }
}
