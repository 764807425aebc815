use spindle::http::parser::{HeaderDiagnostic, ParseError, parse_head, parse_request};
use spindle::http::request::Method;

#[test]
fn test_parse_simple_get_request() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, consumed) = parse_request(req).unwrap();

    assert_eq!(parsed.method, Method::GET);
    assert_eq!(parsed.path, "/");
    assert_eq!(parsed.version, "HTTP/1.1");
    assert_eq!(parsed.header("Host"), Some("example.com"));
    assert!(parsed.body.is_empty());
    assert_eq!(parsed.content_length, 0);
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_post_request_with_body() {
    let req = b"POST /api HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello";
    let (parsed, consumed) = parse_request(req).unwrap();

    assert_eq!(parsed.method, Method::POST);
    assert_eq!(parsed.path, "/api");
    assert_eq!(parsed.body, b"hello");
    assert_eq!(parsed.content_length, 5);
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_request_with_path_and_query_string() {
    let req = b"GET /search?q=rust HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, _) = parse_request(req).unwrap();

    assert_eq!(parsed.path, "/search?q=rust");
}

#[test]
fn test_parse_path_is_not_normalized() {
    let req = b"GET /a/../b//c HTTP/1.1\r\n\r\n";
    let (parsed, _) = parse_request(req).unwrap();

    assert_eq!(parsed.path, "/a/../b//c");
}

#[test]
fn test_parse_incomplete_request_missing_blank_line() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n";

    assert_eq!(parse_request(req).unwrap_err(), ParseError::Incomplete);
}

#[test]
fn test_parse_incomplete_request_partial_body() {
    let req = b"POST /api HTTP/1.1\r\nContent-Length: 5\r\n\r\nhel";

    assert_eq!(parse_request(req).unwrap_err(), ParseError::Incomplete);
}

#[test]
fn test_parse_split_at_every_offset_matches_single_read() {
    let req: &[u8] = b"PUT /items/7 HTTP/1.1\r\nHost: x\r\nContent-Length: 4\r\n\r\nabcd";
    let (whole, whole_len) = parse_request(req).unwrap();

    for split in 0..req.len() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&req[..split]);
        assert_eq!(parse_request(&buf).unwrap_err(), ParseError::Incomplete, "split at {split}");

        buf.extend_from_slice(&req[split..]);
        let (assembled, len) = parse_request(&buf).unwrap();
        assert_eq!(assembled, whole);
        assert_eq!(len, whole_len);
    }
}

#[test]
fn test_parse_request_line_split_across_reads() {
    let mut buf = b"GET /".to_vec();
    assert_eq!(parse_request(&buf).unwrap_err(), ParseError::Incomplete);

    buf.extend_from_slice(b" HTTP/1.1\r\n\r\n");
    let (parsed, _) = parse_request(&buf).unwrap();
    assert_eq!(parsed.path, "/");
}

#[test]
fn test_parse_unknown_method_is_kept() {
    let req = b"FOO /x HTTP/1.1\r\n\r\n";
    let (parsed, _) = parse_request(req).unwrap();

    assert_eq!(parsed.method, Method::Unknown("FOO".to_string()));
    assert_eq!(parsed.path, "/x");
}

#[test]
fn test_parse_malformed_header_is_reported_not_fatal() {
    let req = b"GET / HTTP/1.1\r\nBrokenHeader\r\nHost: x\r\n\r\n";
    let (parsed, _) = parse_request(req).unwrap();

    assert_eq!(parsed.header("Host"), Some("x"));
    assert!(parsed.is_malformed());
    assert_eq!(
        parsed.diagnostics,
        vec![HeaderDiagnostic::MissingColon {
            line: 2,
            raw: "BrokenHeader".to_string()
        }]
    );
}

#[test]
fn test_parse_header_splits_on_first_colon() {
    let req = b"GET / HTTP/1.1\r\nHost: localhost:8080\r\nX-Empty:\r\nX-Tight:value\r\n\r\n";
    let (parsed, _) = parse_request(req).unwrap();

    assert_eq!(parsed.header("host"), Some("localhost:8080"));
    assert_eq!(parsed.header("X-Empty"), Some(""));
    assert_eq!(parsed.header("X-Tight"), Some("value"));
}

#[test]
fn test_parse_lowercase_content_length() {
    let req = b"POST / HTTP/1.1\r\ncontent-length: 2\r\n\r\nok";
    let (parsed, _) = parse_request(req).unwrap();

    assert_eq!(parsed.body, b"ok");
}

#[test]
fn test_parse_invalid_content_length_is_an_error() {
    let req = b"POST / HTTP/1.1\r\nContent-Length: abc\r\n\r\n";

    assert_eq!(
        parse_request(req).unwrap_err(),
        ParseError::InvalidContentLength("abc".to_string())
    );
}

#[test]
fn test_parse_negative_content_length_is_an_error() {
    let req = b"POST / HTTP/1.1\r\nContent-Length: -3\r\n\r\n";

    assert!(matches!(
        parse_request(req),
        Err(ParseError::InvalidContentLength(_))
    ));
}

#[test]
fn test_parse_request_line_without_spaces() {
    let req = b"GARBAGE\r\n\r\n";

    assert_eq!(parse_request(req).unwrap_err(), ParseError::InvalidRequestLine);
}

#[test]
fn test_parse_non_utf8_head() {
    let req = b"GET /\xff HTTP/1.1\r\n\r\n";

    assert_eq!(parse_request(req).unwrap_err(), ParseError::InvalidEncoding);
}

#[test]
fn test_parse_request_with_binary_body() {
    let req = b"POST /upload HTTP/1.1\r\nContent-Length: 4\r\n\r\n\x00\x01\x02\x03";
    let (parsed, _) = parse_request(req).unwrap();

    assert_eq!(parsed.body, b"\x00\x01\x02\x03");
}

#[test]
fn test_parse_leaves_following_request_unconsumed() {
    let req = b"POST /a HTTP/1.1\r\nContent-Length: 1\r\n\r\nxGET /b HTTP/1.1\r\n\r\n";
    let (first, consumed) = parse_request(req).unwrap();
    assert_eq!(first.body, b"x");

    let (second, _) = parse_request(&req[consumed..]).unwrap();
    assert_eq!(second.path, "/b");
    assert!(second.body.is_empty());
}

#[test]
fn test_parse_head_reports_frame_length() {
    let req = b"POST / HTTP/1.1\r\nContent-Length: 3\r\n\r\nabcEXTRA";
    let head = parse_head(req).unwrap();

    assert_eq!(head.header_len, req.len() - 8);
    assert_eq!(head.frame_len(), req.len() - 5);
}
