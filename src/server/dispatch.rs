//! Per-connection transitions driven by readiness events.
//!
//! These functions own the Reading -> Dispatching -> Writing cycle. They never
//! touch the multiplexer: the event loop re-syncs interest from
//! [`Connection::interest`] after each call.

use std::io::{Read, Write};

use tracing::{debug, error, warn};

use crate::config::KeepAlive;
use crate::http::connection::{Connection, ConnectionState, FlushOutcome, ReadOutcome};
use crate::http::parser::{ParseError, ParsedHead, parse_head};
use crate::http::response::{Response, StatusCode};
use crate::server::handler::Handler;

/// What the event loop should do with the connection next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Keep,
    Close(&'static str),
}

/// Handles a readable event: drain the socket, then frame and dispatch.
///
/// Bytes that arrive while a response is still being written are buffered
/// but not parsed until the flush completes. End-of-stream closes the
/// connection at once, so a request followed by a half-close is dropped
/// without a reply.
pub fn on_readable<S, H>(conn: &mut Connection<S>, handler: &mut H, keep_alive: KeepAlive) -> Next
where
    S: Read + Write,
    H: Handler<S>,
{
    loop {
        let outcome = match conn.fill_read_buffer() {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(conn = %conn.id(), error = %e, "read failed");
                return Next::Close("read error");
            }
        };

        if outcome == ReadOutcome::PeerClosed {
            return Next::Close("peer closed");
        }

        if conn.state() != ConnectionState::Reading {
            return Next::Keep;
        }

        let next = advance(conn, handler, keep_alive);
        if next != Next::Keep {
            return next;
        }

        if conn.state() != ConnectionState::Reading {
            // The flush in `on_writable` resumes reading once it completes.
            return Next::Keep;
        }

        if conn.read_buffer_full() {
            warn!(
                conn = %conn.id(),
                buffered = conn.read_buffer().len(),
                "request exceeds read buffer limit"
            );
            return reject(conn, StatusCode::PAYLOAD_TOO_LARGE);
        }

        // The fill stopped at the ceiling with bytes left in the socket and
        // dispatch has since made room. No new edge will report them.
        if outcome == ReadOutcome::Open {
            return Next::Keep;
        }
    }
}

/// Handles a writable event: flush from the cursor, then either close or
/// return to reading depending on policy.
pub fn on_writable<S, H>(conn: &mut Connection<S>, handler: &mut H, keep_alive: KeepAlive) -> Next
where
    S: Read + Write,
    H: Handler<S>,
{
    // Readiness is edge-triggered: bytes already buffered, still waiting in the
    // socket, or queued by a follow-up dispatch would not produce another
    // event, so keep going until the socket blocks.
    while conn.state() == ConnectionState::Writing {
        match conn.flush() {
            Ok(FlushOutcome::Pending) => return Next::Keep,
            Ok(FlushOutcome::Complete) if conn.closes_after_flush() => return Next::Close("response sent"),
            Ok(FlushOutcome::Complete) => {
                conn.set_state(ConnectionState::Reading);
                let next = on_readable(conn, handler, keep_alive);
                if next != Next::Keep {
                    return next;
                }
            }
            Err(e) => {
                debug!(conn = %conn.id(), error = %e, "write failed");
                return Next::Close("write error");
            }
        }
    }

    Next::Keep
}

/// Dispatches every complete request at the front of the read buffer while
/// the connection stays in `Reading`.
fn advance<S, H>(conn: &mut Connection<S>, handler: &mut H, keep_alive: KeepAlive) -> Next
where
    H: Handler<S>,
{
    while conn.state() == ConnectionState::Reading {
        let head = match parse_head(conn.read_buffer()) {
            Ok(head) => head,
            Err(ParseError::Incomplete) => return Next::Keep,
            Err(e) => {
                warn!(conn = %conn.id(), peer = %conn.peer_addr(), error = %e, "rejecting malformed request");
                return reject(conn, StatusCode::BAD_REQUEST);
            }
        };

        let next = dispatch(conn, handler, keep_alive, head);
        if next != Next::Keep {
            return next;
        }
    }

    Next::Keep
}

fn dispatch<S, H>(conn: &mut Connection<S>, handler: &mut H, keep_alive: KeepAlive, head: ParsedHead) -> Next
where
    H: Handler<S>,
{
    conn.set_state(ConnectionState::Dispatching);

    let frame = conn.take_frame(head.frame_len());
    let request = head.into_request(&frame);

    if request.is_malformed() {
        warn!(
            conn = %conn.id(),
            skipped = request.diagnostics.len(),
            diagnostics = ?request.diagnostics,
            "skipped malformed header lines"
        );
    }
    debug!(conn = %conn.id(), method = %request.method, path = %request.path, "dispatching request");

    let mark = conn.pending_output().len();
    let sent = conn.bytes_sent();
    let result = handler.on_request(conn, &request);
    conn.record_request();

    if let Err(err) = result {
        error!(conn = %conn.id(), error = %err, "request handler failed");
        // Handlers may flush on their own; bytes already on the wire cannot
        // be replaced by an error response.
        if conn.bytes_sent() != sent {
            return Next::Close("handler failed mid-response");
        }
        conn.truncate_output(mark);
        if conn.send(&Response::internal_error()).is_err() {
            return Next::Close("handler failed");
        }
        conn.close_after_flush();
    }

    if !conn.has_pending_output() {
        conn.set_state(ConnectionState::Reading);
        return Next::Keep;
    }

    if keep_alive == KeepAlive::Close {
        conn.close_after_flush();
    }
    if conn.closes_after_flush() {
        conn.clear_read_buffer();
    }
    conn.set_state(ConnectionState::Writing);
    Next::Keep
}

/// Queues an error response and closes once it is flushed.
fn reject<S>(conn: &mut Connection<S>, status: StatusCode) -> Next {
    conn.clear_read_buffer();
    conn.truncate_output(0);
    if conn.send(&Response::error(status)).is_err() {
        return Next::Close("error response did not fit");
    }
    conn.close_after_flush();
    conn.set_state(ConnectionState::Writing);
    Next::Keep
}
