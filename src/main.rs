use spindle::http::request::{Method, Request};
use spindle::http::response::Response;
use spindle::{Config, Connection, Handler, Server};

/// Answers `GET /` with an incrementing counter and 404 for everything else.
#[derive(Default)]
struct Counter {
    next: u64,
}

impl Handler for Counter {
    fn on_connect(&mut self, conn: &Connection) {
        tracing::info!(conn = %conn.id(), peer = %conn.peer_addr(), "Connected");
    }

    fn on_disconnect(&mut self, conn: &Connection) {
        tracing::info!(conn = %conn.id(), "Disconnected");
    }

    fn on_request(&mut self, conn: &mut Connection, request: &Request<'_>) -> anyhow::Result<()> {
        tracing::info!(conn = %conn.id(), "{} {}", request.method, request.path);

        let response = if request.method == Method::GET && request.path == "/" {
            let body = self.next.to_string();
            self.next += 1;
            Response::ok(body)
        } else {
            Response::not_found()
        };

        conn.send(&response)?;
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let mut server = Server::bind(cfg, Counter::default())?;
    server.run()
}
