use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Serializes a response into a fresh buffer.
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::with_capacity(128 + resp.body.len());
    write_response(resp, &mut buf);
    buf
}

/// Appends the wire form of `resp` to `buf`.
///
/// Layout: status line, headers in insertion order, a `Content-Length`
/// computed from the body, blank line, body. A caller-supplied
/// `Content-Length` header is dropped so the two can never disagree.
pub fn write_response(resp: &Response, buf: &mut Vec<u8>) {
    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (k, v) in resp.headers.iter() {
        if k.eq_ignore_ascii_case("Content-Length") {
            continue;
        }
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    buf.extend_from_slice(format!("Content-Length: {}\r\n", resp.body.len()).as_bytes());

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    // Body
    buf.extend_from_slice(&resp.body);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::StatusCode;

    #[test]
    fn counter_reply_matches_wire_format() {
        let out = serialize_response(&Response::ok("0"));
        assert_eq!(out, b"HTTP/1.1 200 OK\r\nContent-Length: 1\r\n\r\n0");
    }

    #[test]
    fn caller_content_length_is_overridden() {
        let resp = Response::new(StatusCode::OK)
            .with_header("content-length", "999")
            .with_body("abc");
        let out = String::from_utf8(serialize_response(&resp)).unwrap();

        assert!(out.contains("Content-Length: 3\r\n"));
        assert!(!out.contains("999"));
    }
}
