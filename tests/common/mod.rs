#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::SocketAddr;

use spindle::http::connection::{BufferLimits, Connection, ConnectionId};

/// In-memory socket with scripted reads and writes.
///
/// Reads hand out the queued chunks one per call and report `WouldBlock` once
/// they run out (or end-of-stream if `eof` is set). Each write call consumes
/// one entry of `write_plan`: `0` means `WouldBlock`, `n` accepts at most `n`
/// bytes. With an empty plan every write is accepted in full.
#[derive(Debug, Default)]
pub struct MockStream {
    pub incoming: VecDeque<Vec<u8>>,
    pub eof: bool,
    pub written: Vec<u8>,
    pub write_plan: VecDeque<usize>,
    pub write_calls: usize,
}

impl MockStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.incoming.push_back(chunk.to_vec());
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(mut chunk) = self.incoming.pop_front() else {
            return if self.eof {
                Ok(0)
            } else {
                Err(io::ErrorKind::WouldBlock.into())
            };
        };

        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            chunk.drain(..n);
            self.incoming.push_front(chunk);
        }
        Ok(n)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_calls += 1;
        let allowed = match self.write_plan.pop_front() {
            Some(0) => return Err(io::ErrorKind::WouldBlock.into()),
            Some(n) => n.min(buf.len()),
            None => buf.len(),
        };
        self.written.extend_from_slice(&buf[..allowed]);
        Ok(allowed)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

/// A registered connection in the `Reading` state.
pub fn connection(limits: BufferLimits) -> Connection<MockStream> {
    let mut conn = Connection::new(ConnectionId::new(1), MockStream::new(), peer(), limits);
    conn.mark_registered();
    conn
}
