//! Spindle - single-threaded HTTP/1.1 connection engine
//!
//! Accepts TCP connections, frames requests incrementally from readiness
//! events, hands each complete request to a [`Handler`] and flushes the queued
//! response without blocking the loop.

pub mod config;
pub mod http;
pub mod server;

pub use config::{Config, KeepAlive};
pub use http::connection::{Connection, ConnectionId, ConnectionState};
pub use http::request::{Method, Request};
pub use http::response::{Response, StatusCode};
pub use server::{Handler, Server, ShutdownHandle};
