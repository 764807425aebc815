use thiserror::Error;

use crate::http::headers::HeaderTable;
use crate::http::request::{Method, Request};

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The buffer does not yet hold a complete message.
    #[error("request is incomplete")]
    Incomplete,

    #[error("malformed request line")]
    InvalidRequestLine,

    #[error("request head is not valid UTF-8")]
    InvalidEncoding,

    #[error("invalid content-length header: {0:?}")]
    InvalidContentLength(String),
}

/// A header line that was skipped. Parsing continues past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderDiagnostic {
    /// `line` is 1-based and counts the request line.
    MissingColon { line: usize, raw: String },
    EmptyName { line: usize, raw: String },
}

/// Everything about a framed request except its body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHead {
    pub method: Method,
    pub path: String,
    pub version: String,
    pub headers: HeaderTable,
    pub content_length: usize,
    pub diagnostics: Vec<HeaderDiagnostic>,
    /// Length of the request line and header block, terminator included.
    pub header_len: usize,
}

impl ParsedHead {
    /// Total bytes the request occupies: head plus body.
    pub fn frame_len(&self) -> usize {
        self.header_len + self.content_length
    }

    /// Attaches the body from `frame`, which must start at the first byte of
    /// this request and hold at least `frame_len()` bytes.
    pub fn into_request(self, frame: &[u8]) -> Request<'_> {
        let body = &frame[self.header_len..self.frame_len()];
        Request {
            method: self.method,
            path: self.path,
            version: self.version,
            headers: self.headers,
            content_length: self.content_length,
            body,
            diagnostics: self.diagnostics,
        }
    }
}

/// Parses one request from the start of `buf`.
///
/// Returns the request and the number of bytes it consumed. Bytes past that
/// point belong to the next request.
pub fn parse_request(buf: &[u8]) -> Result<(Request<'_>, usize), ParseError> {
    let head = parse_head(buf)?;
    let consumed = head.frame_len();
    Ok((head.into_request(buf), consumed))
}

/// Checks framing over the whole accumulated buffer and parses the head.
///
/// Fails with `ParseError::Incomplete` until both the header terminator and
/// `Content-Length` body bytes are present.
pub fn parse_head(buf: &[u8]) -> Result<ParsedHead, ParseError> {
    let headers_end = find_headers_end(buf).ok_or(ParseError::Incomplete)?;
    let head = std::str::from_utf8(&buf[..headers_end]).map_err(|_| ParseError::InvalidEncoding)?;

    let mut lines = head
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line));

    let request_line = lines.next().ok_or(ParseError::InvalidRequestLine)?;
    let (method, path, version) = parse_request_line(request_line)?;

    let mut headers = HeaderTable::new();
    let mut diagnostics = Vec::new();

    for (index, line) in lines.enumerate() {
        if line.is_empty() {
            break;
        }

        let line_no = index + 2;
        match line.split_once(':') {
            Some(("", _)) => diagnostics.push(HeaderDiagnostic::EmptyName {
                line: line_no,
                raw: line.to_string(),
            }),
            Some((name, value)) => {
                headers.insert(name, value.trim_start());
            }
            None => diagnostics.push(HeaderDiagnostic::MissingColon {
                line: line_no,
                raw: line.to_string(),
            }),
        }
    }

    let content_length = headers
        .get("Content-Length")
        .map(parse_content_length)
        .transpose()?
        .unwrap_or(0);

    let header_len = headers_end + HEADER_TERMINATOR.len();
    if buf.len() - header_len < content_length {
        return Err(ParseError::Incomplete);
    }

    Ok(ParsedHead {
        method,
        path: path.to_string(),
        version: version.to_string(),
        headers,
        content_length,
        diagnostics,
        header_len,
    })
}

/// Offset of the `\r\n\r\n` terminator, searched over the entire buffer so a
/// terminator split across reads is still found.
pub fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
}

fn parse_request_line(line: &str) -> Result<(Method, &str, &str), ParseError> {
    let (method, rest) = line.split_once(' ').ok_or(ParseError::InvalidRequestLine)?;
    let (path, version) = rest.split_once(' ').ok_or(ParseError::InvalidRequestLine)?;

    if method.is_empty() || path.is_empty() {
        return Err(ParseError::InvalidRequestLine);
    }

    Ok((Method::parse(method), path, version))
}

fn parse_content_length(value: &str) -> Result<usize, ParseError> {
    let digits = value.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidContentLength(value.to_string()));
    }
    digits
        .parse()
        .map_err(|_| ParseError::InvalidContentLength(value.to_string()))
}
