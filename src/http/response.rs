use std::fmt;

use crate::http::headers::HeaderTable;

/// HTTP status code.
///
/// Any integer is accepted. Common codes have a fixed reason phrase; anything
/// else serializes with a generic phrase for its class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const CREATED: StatusCode = StatusCode(201);
    pub const NO_CONTENT: StatusCode = StatusCode(204);
    pub const MOVED_PERMANENTLY: StatusCode = StatusCode(301);
    pub const NOT_MODIFIED: StatusCode = StatusCode(304);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405);
    pub const REQUEST_TIMEOUT: StatusCode = StatusCode(408);
    pub const PAYLOAD_TOO_LARGE: StatusCode = StatusCode(413);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);
    pub const SERVICE_UNAVAILABLE: StatusCode = StatusCode(503);

    pub const fn new(code: u16) -> Self {
        StatusCode(code)
    }

    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use spindle::http::response::StatusCode;
    /// assert_eq!(StatusCode::OK.as_u16(), 200);
    /// assert_eq!(StatusCode::new(418).as_u16(), 418);
    /// ```
    pub fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns the reason phrase written on the status line.
    ///
    /// # Example
    ///
    /// ```
    /// # use spindle::http::response::StatusCode;
    /// assert_eq!(StatusCode::NOT_FOUND.reason_phrase(), "Not Found");
    /// assert_eq!(StatusCode::new(418).reason_phrase(), "Client Error");
    /// ```
    pub fn reason_phrase(self) -> &'static str {
        match self.0 {
            200 => "OK",
            201 => "Created",
            204 => "No Content",
            301 => "Moved Permanently",
            304 => "Not Modified",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            408 => "Request Timeout",
            413 => "Payload Too Large",
            500 => "Internal Server Error",
            503 => "Service Unavailable",
            100..=199 => "Informational",
            200..=299 => "Success",
            300..=399 => "Redirection",
            400..=499 => "Client Error",
            500..=599 => "Server Error",
            _ => "Unknown",
        }
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

/// A complete HTTP response.
///
/// Built by value through the `with_*` combinators. `Content-Length` is not
/// stored here: the serializer derives it from `body` and ignores any value
/// set through `with_header`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderTable,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: impl Into<StatusCode>) -> Self {
        Self {
            status: status.into(),
            headers: HeaderTable::new(),
            body: Vec::new(),
        }
    }

    /// Adds or replaces a header.
    ///
    /// ```
    /// # use spindle::http::response::{Response, StatusCode};
    /// let response = Response::new(StatusCode::OK)
    ///     .with_header("Content-Type", "text/plain")
    ///     .with_header("Cache-Control", "no-cache");
    /// assert_eq!(response.headers.len(), 2);
    /// ```
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Creates a simple 200 OK response with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Response::new(StatusCode::OK).with_body(body)
    }

    /// Creates a response whose body is the status line text, e.g. `404 Not Found`.
    pub fn error(status: StatusCode) -> Self {
        Response::new(status).with_body(status.to_string())
    }

    pub fn bad_request() -> Self {
        Response::error(StatusCode::BAD_REQUEST)
    }

    pub fn not_found() -> Self {
        Response::error(StatusCode::NOT_FOUND)
    }

    pub fn internal_error() -> Self {
        Response::error(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Value the serializer will emit for `Content-Length`.
    pub fn content_length(&self) -> usize {
        self.body.len()
    }
}
