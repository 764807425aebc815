use std::collections::HashMap;
use std::io;
use std::time::Duration;

use mio::event::Source;
use mio::{Events, Poll};

use crate::server::multiplexer::{Event, EventKind, Interest, Multiplexer, RegistrationError, Token};

/// [`Multiplexer`] backed by `mio::Poll`, which selects epoll, kqueue or IOCP
/// for the target platform.
pub struct Poller {
    poll: Poll,
    events: Events,
    watched: HashMap<Token, Interest>,
}

impl Poller {
    pub fn new(capacity: usize) -> io::Result<Self> {
        Ok(Self {
            poll: Poll::new()?,
            events: Events::with_capacity(capacity),
            watched: HashMap::new(),
        })
    }

    pub fn watched(&self) -> usize {
        self.watched.len()
    }
}

fn to_mio(token: Token, interest: Interest) -> Result<mio::Interest, RegistrationError> {
    match (interest.read, interest.write) {
        (true, true) => Ok(mio::Interest::READABLE | mio::Interest::WRITABLE),
        (true, false) => Ok(mio::Interest::READABLE),
        (false, true) => Ok(mio::Interest::WRITABLE),
        (false, false) => Err(RegistrationError::EmptyInterest(token)),
    }
}

impl Multiplexer for Poller {
    fn watch<S>(&mut self, source: &mut S, token: Token, interest: Interest) -> Result<(), RegistrationError>
    where
        S: Source + ?Sized,
    {
        if self.watched.contains_key(&token) {
            return Err(RegistrationError::AlreadyWatched(token));
        }
        let mio_interest = to_mio(token, interest)?;

        self.poll
            .registry()
            .register(source, mio::Token(token.0), mio_interest)
            .map_err(|source| RegistrationError::Io { token, source })?;

        self.watched.insert(token, interest);
        Ok(())
    }

    fn update<S>(&mut self, source: &mut S, token: Token, interest: Interest) -> Result<(), RegistrationError>
    where
        S: Source + ?Sized,
    {
        let current = self
            .watched
            .get_mut(&token)
            .ok_or(RegistrationError::NotWatched(token))?;
        if *current == interest {
            return Ok(());
        }
        let mio_interest = to_mio(token, interest)?;

        self.poll
            .registry()
            .reregister(source, mio::Token(token.0), mio_interest)
            .map_err(|source| RegistrationError::Io { token, source })?;

        *current = interest;
        Ok(())
    }

    fn unwatch<S>(&mut self, source: &mut S, token: Token) -> Result<(), RegistrationError>
    where
        S: Source + ?Sized,
    {
        if self.watched.remove(&token).is_none() {
            return Err(RegistrationError::NotWatched(token));
        }

        self.poll
            .registry()
            .deregister(source)
            .map_err(|source| RegistrationError::Io { token, source })
    }

    fn wait(&mut self, events: &mut Vec<Event>, timeout: Option<Duration>) -> io::Result<()> {
        events.clear();
        self.poll.poll(&mut self.events, timeout)?;

        for event in self.events.iter() {
            let token = Token(event.token().0);
            let mut push = |kind| events.push(Event { token, kind });

            if event.is_error() {
                push(EventKind::Error);
            }
            // A half-closed peer with unread data still reports Readable; the
            // zero-length read that follows closes the connection.
            if event.is_write_closed() || (event.is_read_closed() && !event.is_readable()) {
                push(EventKind::HangUp);
            }
            if event.is_readable() {
                push(EventKind::Readable);
            }
            if event.is_writable() {
                push(EventKind::Writable);
            }
        }

        Ok(())
    }
}
