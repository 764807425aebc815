use std::fmt;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use mio::net::TcpStream;
use thiserror::Error;

use crate::http::response::Response;
use crate::http::writer::write_response;
use crate::server::multiplexer::Interest;

const READ_CHUNK: usize = 4096;

/// Opaque connection identity. Allocated monotonically and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub const fn new(raw: u64) -> Self {
        ConnectionId(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a connection.
///
/// ```text
/// Accepting -> Reading -> Dispatching -> Writing -> Closed
///                 ^                         |
///                 +------- persistent ------+
/// ```
///
/// Hang-up, I/O errors and end-of-stream jump straight to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Accepting,
    Reading,
    Dispatching,
    Writing,
    Closed,
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("write buffer full: {pending} bytes pending, limit {limit}")]
    WriteBufferFull { pending: usize, limit: usize },

    #[error("peer accepted zero bytes")]
    WriteZero,
}

/// Size ceilings for the per-connection buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferLimits {
    pub read_initial: usize,
    pub read_max: usize,
    pub write_max: usize,
}

impl Default for BufferLimits {
    fn default() -> Self {
        Self {
            read_initial: 4096,
            read_max: 64 * 1024,
            write_max: 1024 * 1024,
        }
    }
}

/// Result of draining the socket into the read buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The socket would block; more data may arrive later.
    Open,
    /// The peer sent end-of-stream.
    PeerClosed,
    /// The read buffer reached its ceiling before the socket drained.
    BufferFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Bytes remain after the flush cursor.
    Pending,
    /// Everything was sent; the buffer is empty and the cursor reset.
    Complete,
}

/// A client connection: socket, buffers and lifecycle state.
pub struct Connection<S = TcpStream> {
    id: ConnectionId,
    stream: S,
    peer: SocketAddr,
    state: ConnectionState,
    read_buf: BytesMut,
    write_buf: Vec<u8>,
    flushed: usize,
    sent: u64,
    limits: BufferLimits,
    close_after_flush: bool,
    last_active: Instant,
    requests_served: u64,
}

impl<S> Connection<S> {
    pub fn new(id: ConnectionId, stream: S, peer: SocketAddr, limits: BufferLimits) -> Self {
        Self {
            id,
            stream,
            peer,
            state: ConnectionState::Accepting,
            read_buf: BytesMut::with_capacity(limits.read_initial),
            write_buf: Vec::new(),
            flushed: 0,
            sent: 0,
            limits,
            close_after_flush: false,
            last_active: Instant::now(),
            requests_served: 0,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
    }

    /// Accepting -> Reading, once the socket is watched for readability.
    pub fn mark_registered(&mut self) {
        if self.state == ConnectionState::Accepting {
            self.state = ConnectionState::Reading;
        }
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn requests_served(&self) -> u64 {
        self.requests_served
    }

    pub(crate) fn record_request(&mut self) {
        self.requests_served += 1;
    }

    /// Bytes received and not yet consumed by a framed request.
    pub fn read_buffer(&self) -> &[u8] {
        &self.read_buf
    }

    pub fn read_buffer_full(&self) -> bool {
        self.read_buf.len() >= self.limits.read_max
    }

    /// Splits the first `len` bytes off the read buffer.
    ///
    /// Anything after them stays buffered for the next request.
    pub(crate) fn take_frame(&mut self, len: usize) -> Bytes {
        self.read_buf.split_to(len).freeze()
    }

    pub(crate) fn clear_read_buffer(&mut self) {
        self.read_buf.clear();
    }

    /// Queues raw bytes for sending.
    ///
    /// Fails without queuing anything when the unflushed total would exceed
    /// the write ceiling.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), ConnectionError> {
        let pending = self.pending_output().len() + bytes.len();
        if pending > self.limits.write_max {
            return Err(ConnectionError::WriteBufferFull {
                pending,
                limit: self.limits.write_max,
            });
        }
        self.write_buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Serializes `response` and queues it.
    pub fn send(&mut self, response: &Response) -> Result<(), ConnectionError> {
        let mut wire = Vec::with_capacity(128 + response.body.len());
        write_response(response, &mut wire);
        self.write(&wire)
    }

    /// Bytes queued but not yet sent.
    pub fn pending_output(&self) -> &[u8] {
        &self.write_buf[self.flushed..]
    }

    pub fn has_pending_output(&self) -> bool {
        self.flushed < self.write_buf.len()
    }

    /// Flush cursor: bytes of the current write buffer already sent.
    pub fn bytes_flushed(&self) -> usize {
        self.flushed
    }

    /// Total bytes written to the peer over the connection's lifetime.
    pub fn bytes_sent(&self) -> u64 {
        self.sent
    }

    /// Drops queued bytes past `len`. Only valid while nothing has been sent.
    pub(crate) fn truncate_output(&mut self, len: usize) {
        if self.flushed == 0 {
            self.write_buf.truncate(len);
        }
    }

    pub(crate) fn close_after_flush(&mut self) {
        self.close_after_flush = true;
    }

    pub fn closes_after_flush(&self) -> bool {
        self.close_after_flush
    }

    /// Interest to register: always readable, writable only while output is pending.
    pub fn interest(&self) -> Interest {
        if self.has_pending_output() {
            Interest::READ_WRITE
        } else {
            Interest::READABLE
        }
    }

    pub(crate) fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_active)
    }

    /// Moves to `Closed`. Returns false if the connection was already closed.
    pub fn close(&mut self) -> bool {
        if self.state == ConnectionState::Closed {
            return false;
        }
        self.state = ConnectionState::Closed;
        true
    }
}

impl<S: Read> Connection<S> {
    /// Reads until the socket would block, the peer closes, or the read
    /// buffer reaches its ceiling.
    pub fn fill_read_buffer(&mut self) -> Result<ReadOutcome, ConnectionError> {
        let mut temp = [0u8; READ_CHUNK];

        loop {
            let room = self.limits.read_max.saturating_sub(self.read_buf.len());
            if room == 0 {
                return Ok(ReadOutcome::BufferFull);
            }

            let want = room.min(temp.len());
            match self.stream.read(&mut temp[..want]) {
                Ok(0) => return Ok(ReadOutcome::PeerClosed),
                Ok(n) => {
                    self.read_buf.extend_from_slice(&temp[..n]);
                    self.touch();
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(ReadOutcome::Open),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl<S: Write> Connection<S> {
    /// Sends from the flush cursor until the socket would block or the
    /// buffer is empty.
    pub fn flush(&mut self) -> Result<FlushOutcome, ConnectionError> {
        while self.flushed < self.write_buf.len() {
            match self.stream.write(&self.write_buf[self.flushed..]) {
                Ok(0) => return Err(ConnectionError::WriteZero),
                Ok(n) => {
                    self.flushed += n;
                    self.sent += n as u64;
                    self.touch();
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(FlushOutcome::Pending),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        self.write_buf.clear();
        self.flushed = 0;
        Ok(FlushOutcome::Complete)
    }
}

impl<S> fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("state", &self.state)
            .field("buffered", &self.read_buf.len())
            .field("pending", &self.pending_output().len())
            .finish_non_exhaustive()
    }
}
