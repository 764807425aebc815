use std::fmt;

use crate::http::headers::HeaderTable;
use crate::http::parser::HeaderDiagnostic;

/// HTTP request methods.
///
/// Tokens outside the standard set are kept verbatim in `Unknown` rather than
/// rejected; the handler decides what to do with them.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// CONNECT - Establish a tunnel
    CONNECT,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// TRACE - Message loop-back test
    TRACE,
    /// PATCH - Partial modification of a resource
    PATCH,
    /// Any other token, as received
    Unknown(String),
}

impl Method {
    /// Parses a method token. Matching is case-sensitive, as on the wire.
    ///
    /// # Example
    ///
    /// ```
    /// # use spindle::http::request::Method;
    /// assert_eq!(Method::parse("GET"), Method::GET);
    /// assert_eq!(Method::parse("get"), Method::Unknown("get".to_string()));
    /// ```
    pub fn parse(token: &str) -> Self {
        match token {
            "GET" => Method::GET,
            "HEAD" => Method::HEAD,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "CONNECT" => Method::CONNECT,
            "OPTIONS" => Method::OPTIONS,
            "TRACE" => Method::TRACE,
            "PATCH" => Method::PATCH,
            other => Method::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::CONNECT => "CONNECT",
            Method::OPTIONS => "OPTIONS",
            Method::TRACE => "TRACE",
            Method::PATCH => "PATCH",
            Method::Unknown(raw) => raw,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Method::Unknown(_))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully framed HTTP request.
///
/// The body borrows the bytes of the framed message and is only valid for the
/// duration of the dispatch call. Handlers copy out anything they need to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request<'a> {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The raw request target, not normalized
    pub path: String,
    /// HTTP version token (typically "HTTP/1.1"), not validated
    pub version: String,
    /// Request headers in arrival order
    pub headers: HeaderTable,
    /// Declared body length, 0 when the header is absent
    pub content_length: usize,
    /// Exactly `content_length` bytes following the header block
    pub body: &'a [u8],
    /// Header lines that could not be parsed
    pub diagnostics: Vec<HeaderDiagnostic>,
}

impl Request<'_> {
    /// Retrieves a header value by name, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// True when at least one header line was dropped during parsing.
    pub fn is_malformed(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_round_trips_through_str() {
        for token in ["GET", "HEAD", "POST", "PUT", "DELETE", "CONNECT", "OPTIONS", "TRACE", "PATCH"] {
            let method = Method::parse(token);
            assert!(!method.is_unknown());
            assert_eq!(method.as_str(), token);
        }
    }

    #[test]
    fn unknown_method_keeps_raw_token() {
        let method = Method::parse("FOO");
        assert_eq!(method, Method::Unknown("FOO".to_string()));
        assert_eq!(method.to_string(), "FOO");
    }
}
