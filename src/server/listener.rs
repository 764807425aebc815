use std::collections::HashMap;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use anyhow::Context;
use mio::net::{TcpListener, TcpStream};
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::http::connection::{Connection, ConnectionId};
use crate::server::dispatch::{self, Next};
use crate::server::handler::Handler;
use crate::server::multiplexer::{Event, EventKind, Interest, Multiplexer, Token, order_events};
use crate::server::poller::Poller;

/// Token of the listening socket. Connection ids start above it.
pub const LISTENER: Token = Token(0);

/// Stops a running [`Server`] from another thread.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Single-threaded event loop: owns the listener, the multiplexer and the
/// connection table.
pub struct Server<H, M = Poller> {
    config: Config,
    listener: TcpListener,
    mux: M,
    handler: H,
    connections: HashMap<Token, Connection>,
    next_id: u64,
    events: Vec<Event>,
    shutdown: ShutdownHandle,
}

impl<H: Handler> Server<H, Poller> {
    /// Binds the configured address with the mio backend.
    pub fn bind(config: Config, handler: H) -> anyhow::Result<Self> {
        let poller = Poller::new(config.events_capacity).context("creating poller")?;
        Self::with_multiplexer(config, handler, poller)
    }
}

impl<H: Handler, M: Multiplexer> Server<H, M> {
    /// Binds and registers the listener. Any failure aborts startup.
    pub fn with_multiplexer(config: Config, handler: H, mut mux: M) -> anyhow::Result<Self> {
        config.validate()?;

        let mut listener = bind_listener(&config)?;
        mux.watch(&mut listener, LISTENER, Interest::READABLE)
            .context("registering listener")?;

        Ok(Self {
            config,
            listener,
            mux,
            handler,
            connections: HashMap::new(),
            next_id: LISTENER.0 as u64 + 1,
            events: Vec::new(),
            shutdown: ShutdownHandle::default(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Runs until the shutdown handle fires, then closes every connection.
    pub fn run(&mut self) -> anyhow::Result<()> {
        info!("Listening on {}", self.local_addr()?);

        while !self.shutdown.is_shutdown() {
            self.turn().context("waiting for events")?;
        }

        let tokens: Vec<Token> = self.connections.keys().copied().collect();
        for token in tokens {
            self.close(token, "server shutdown");
        }
        info!("Server stopped");
        Ok(())
    }

    /// One loop iteration: wait, handle the batch, reap idle connections.
    pub fn turn(&mut self) -> io::Result<()> {
        let mut events = std::mem::take(&mut self.events);

        match self.mux.wait(&mut events, Some(self.config.poll_interval())) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                self.events = events;
                return Err(e);
            }
        }

        order_events(&mut events, LISTENER);
        for event in &events {
            self.handle_event(*event);
        }
        self.events = events;

        self.sweep_idle(Instant::now());
        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        if event.token == LISTENER {
            if event.kind == EventKind::Readable {
                self.accept_pending();
            }
            return;
        }

        let token = event.token;
        // Already closed earlier in this batch.
        let Some(conn) = self.connections.get_mut(&token) else {
            return;
        };

        let keep_alive = self.config.keep_alive;
        let next = match event.kind {
            EventKind::HangUp => Next::Close("peer hung up"),
            EventKind::Error => Next::Close("socket error"),
            EventKind::Readable => dispatch::on_readable(conn, &mut self.handler, keep_alive),
            EventKind::Writable => dispatch::on_writable(conn, &mut self.handler, keep_alive),
        };

        match next {
            Next::Keep => self.sync_interest(token),
            Next::Close(reason) => self.close(token, reason),
        }
    }

    fn accept_pending(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => self.register(stream, peer),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    break;
                }
            }
        }
    }

    fn register(&mut self, stream: TcpStream, peer: SocketAddr) {
        if self.connections.len() >= self.config.max_connections {
            warn!(
                peer = %peer,
                limit = self.config.max_connections,
                "connection limit reached, dropping"
            );
            return;
        }

        let id = ConnectionId::new(self.next_id);
        self.next_id += 1;
        let Ok(token) = Token::try_from(id) else {
            warn!(conn = %id, peer = %peer, "connection ids exhausted, dropping");
            return;
        };

        let mut conn = Connection::new(id, stream, peer, self.config.buffer_limits());
        if let Err(e) = self.mux.watch(conn.stream_mut(), token, Interest::READABLE) {
            warn!(conn = %id, peer = %peer, error = %e, "could not watch connection");
            return;
        }
        conn.mark_registered();

        debug!(conn = %id, peer = %peer, "accepted connection");
        self.handler.on_connect(&conn);
        self.connections.insert(token, conn);
    }

    /// Enables write interest exactly while output is pending.
    fn sync_interest(&mut self, token: Token) {
        let Some(conn) = self.connections.get_mut(&token) else {
            return;
        };

        let interest = conn.interest();
        let id = conn.id();
        if let Err(e) = self.mux.update(conn.stream_mut(), token, interest) {
            warn!(conn = %id, error = %e, "could not update interest");
            self.close(token, "interest update failed");
        }
    }

    /// Unregisters, fires the disconnect hook and drops the socket. Closing a
    /// token that is no longer in the table does nothing.
    fn close(&mut self, token: Token, reason: &'static str) {
        let Some(mut conn) = self.connections.remove(&token) else {
            return;
        };
        if !conn.close() {
            return;
        }

        let id = conn.id();
        if let Err(e) = self.mux.unwatch(conn.stream_mut(), token) {
            debug!(conn = %id, error = %e, "unwatch failed");
        }
        debug!(conn = %id, peer = %conn.peer_addr(), reason, "connection closed");
        self.handler.on_disconnect(&conn);
    }

    fn sweep_idle(&mut self, now: Instant) {
        let Some(limit) = self.config.idle_timeout() else {
            return;
        };

        let idle: Vec<Token> = self
            .connections
            .iter()
            .filter(|(_, conn)| conn.idle_for(now) >= limit)
            .map(|(token, _)| *token)
            .collect();

        for token in idle {
            self.close(token, "idle timeout");
        }
    }
}

fn bind_listener(cfg: &Config) -> anyhow::Result<TcpListener> {
    let listen_addr = cfg.listen_addr();
    let addr = (cfg.host.as_str(), cfg.port)
        .to_socket_addrs()
        .with_context(|| format!("resolving {listen_addr}"))?
        .next()
        .with_context(|| format!("no address found for {listen_addr}"))?;

    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .context("creating listening socket")?;
    socket
        .set_reuse_address(true)
        .context("setting SO_REUSEADDR")?;
    socket
        .bind(&addr.into())
        .with_context(|| format!("binding {addr}"))?;
    socket
        .listen(i32::try_from(cfg.backlog).unwrap_or(i32::MAX))
        .with_context(|| format!("listening on {addr}"))?;
    socket
        .set_nonblocking(true)
        .context("setting listener non-blocking")?;

    Ok(TcpListener::from_std(socket.into()))
}
