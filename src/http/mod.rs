//! HTTP protocol implementation.
//!
//! This module implements the constrained HTTP/1.1 subset the server speaks:
//! `Content-Length` framed bodies, no chunked encoding, one request in flight
//! per connection.
//!
//! # Architecture
//!
//! - **`headers`**: Ordered, case-insensitive header table used by requests and responses
//! - **`request`**: Request and method representation
//! - **`parser`**: Frames and parses requests from an accumulated byte buffer
//! - **`response`**: Response value and status reason phrases
//! - **`writer`**: Serializes responses to wire bytes
//! - **`connection`**: Per-connection buffers and the lifecycle state machine
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │  Accepting  │ ← Registered with read interest
//!        └──────┬──────┘
//!               ▼
//!        ┌─────────────┐
//!        │   Reading   │ ← Append to read buffer, rescan for a full frame
//!        └──────┬──────┘
//!               │ Frame complete
//!               ▼
//!        ┌──────────────────┐
//!        │   Dispatching    │ ← Handler queues the response
//!        └──────┬───────────┘
//!               │ Output queued, write interest on
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Flush from the cursor, partial sends resume
//!        └──────┬───────────┘
//!               │ Buffer drained, write interest off
//!               ├─ Persistent → Reading (same connection)
//!               └─ Close → Closed
//! ```
//!
//! # Example
//!
//! ```
//! use spindle::http::parser::parse_request;
//! use spindle::http::response::Response;
//! use spindle::http::writer::serialize_response;
//!
//! let (request, consumed) = parse_request(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n").unwrap();
//! assert_eq!(request.path, "/");
//! assert_eq!(consumed, 27);
//!
//! let wire = serialize_response(&Response::ok("0"));
//! assert_eq!(wire, b"HTTP/1.1 200 OK\r\nContent-Length: 1\r\n\r\n0");
//! ```

pub mod connection;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
