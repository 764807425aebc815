//! Readiness-event source used by the event loop.
//!
//! The loop only talks to the [`Multiplexer`] trait. The backend that turns it
//! into epoll, kqueue or IOCP calls lives in [`crate::server::poller`].

use std::io;
use std::num::TryFromIntError;
use std::time::Duration;

use mio::event::Source;
use thiserror::Error;

use crate::http::connection::ConnectionId;

/// Registration key reported back with every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(pub usize);

/// Fails when the id does not fit in a `usize`, so two ids never share a token.
impl TryFrom<ConnectionId> for Token {
    type Error = TryFromIntError;

    fn try_from(id: ConnectionId) -> Result<Self, Self::Error> {
        usize::try_from(id.as_u64()).map(Token)
    }
}

/// Which readiness kinds a source is watched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Interest {
    pub read: bool,
    pub write: bool,
}

impl Interest {
    pub const NONE: Interest = Interest { read: false, write: false };
    pub const READABLE: Interest = Interest { read: true, write: false };
    pub const WRITABLE: Interest = Interest { read: false, write: true };
    pub const READ_WRITE: Interest = Interest { read: true, write: true };

    pub fn is_empty(self) -> bool {
        !self.read && !self.write
    }
}

/// Kind of readiness. The derived order is the processing priority for
/// events on the same source within one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    HangUp,
    Error,
    Readable,
    Writable,
}

impl EventKind {
    fn rank(self) -> u8 {
        match self {
            EventKind::HangUp | EventKind::Error => 0,
            EventKind::Readable => 1,
            EventKind::Writable => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub token: Token,
    pub kind: EventKind,
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("token {0:?} is already watched")]
    AlreadyWatched(Token),

    #[error("token {0:?} is not watched")]
    NotWatched(Token),

    #[error("empty interest for token {0:?}")]
    EmptyInterest(Token),

    #[error("registering token {token:?}: {source}")]
    Io {
        token: Token,
        #[source]
        source: io::Error,
    },
}

/// Portable readiness multiplexer.
pub trait Multiplexer {
    /// Starts watching `source`. Fails if `token` is already watched.
    fn watch<S>(&mut self, source: &mut S, token: Token, interest: Interest) -> Result<(), RegistrationError>
    where
        S: Source + ?Sized;

    /// Changes the interest set. Calling it with the current interest is a no-op.
    fn update<S>(&mut self, source: &mut S, token: Token, interest: Interest) -> Result<(), RegistrationError>
    where
        S: Source + ?Sized;

    /// Stops watching. Must happen before the source is closed.
    fn unwatch<S>(&mut self, source: &mut S, token: Token) -> Result<(), RegistrationError>
    where
        S: Source + ?Sized;

    /// Blocks until at least one event is ready or `timeout` elapses, then
    /// replaces the contents of `events`. A token may appear more than once.
    fn wait(&mut self, events: &mut Vec<Event>, timeout: Option<Duration>) -> io::Result<()>;
}

/// Orders a batch so `accept` runs first and, per source, hang-up and errors
/// are handled before reads, and reads before writes.
///
/// The sort is stable, so events of equal rank keep the order the backend
/// reported them in.
pub fn order_events(events: &mut [Event], listener: Token) {
    events.sort_by_key(|event| (event.token != listener, event.kind.rank()));
}
