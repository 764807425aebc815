use mio::net::TcpStream;

use crate::http::connection::Connection;
use crate::http::request::Request;

/// Application logic injected into the event loop.
///
/// Every method runs synchronously on the event-loop thread and must not
/// block: a slow handler stalls every other connection.
pub trait Handler<S = TcpStream> {
    /// Called once the connection is registered and reading.
    fn on_connect(&mut self, _conn: &Connection<S>) {}

    /// Called exactly once when the connection closes, for any reason.
    fn on_disconnect(&mut self, _conn: &Connection<S>) {}

    /// Called with each fully framed request.
    ///
    /// Respond by queuing bytes on `conn`, usually with [`Connection::send`].
    /// The request body is only valid inside this call. Returning an error
    /// answers 500 if nothing was sent yet, otherwise closes the connection.
    fn on_request(&mut self, conn: &mut Connection<S>, request: &Request<'_>) -> anyhow::Result<()>;
}

impl<S, F> Handler<S> for F
where
    F: FnMut(&mut Connection<S>, &Request<'_>) -> anyhow::Result<()>,
{
    fn on_request(&mut self, conn: &mut Connection<S>, request: &Request<'_>) -> anyhow::Result<()> {
        self(conn, request)
    }
}
