//! Event loop and the readiness plumbing around it.
//!
//! - **`multiplexer`**: the portable readiness interface the loop is written against
//! - **`poller`**: the mio-backed implementation (epoll, kqueue or IOCP)
//! - **`handler`**: the application hooks invoked by the loop
//! - **`dispatch`**: per-connection read, dispatch and flush transitions
//! - **`listener`**: the [`Server`] owning the listener and connection table

pub mod dispatch;
pub mod handler;
pub mod listener;
pub mod multiplexer;
pub mod poller;

pub use handler::Handler;
pub use listener::{Server, ShutdownHandle};
pub use multiplexer::{Event, EventKind, Interest, Multiplexer, RegistrationError, Token};
pub use poller::Poller;
