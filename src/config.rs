use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;

use crate::http::connection::BufferLimits;

/// What happens to a connection after a response is fully flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeepAlive {
    /// Close after one response.
    #[default]
    Close,
    /// Go back to reading the next request.
    Persistent,
}

/// Server configuration.
///
/// Every field has a default, so a YAML file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backlog: u32,
    pub max_connections: usize,
    pub read_buffer_initial: usize,
    pub read_buffer_max: usize,
    pub write_buffer_max: usize,
    pub keep_alive: KeepAlive,
    /// Connections silent for this long are closed. 0 disables the sweep.
    pub idle_timeout_ms: u64,
    /// Upper bound on one multiplexer wait.
    pub poll_interval_ms: u64,
    pub events_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        let limits = BufferLimits::default();
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            backlog: 1024,
            max_connections: 1024,
            read_buffer_initial: limits.read_initial,
            read_buffer_max: limits.read_max,
            write_buffer_max: limits.write_max,
            keep_alive: KeepAlive::Close,
            idle_timeout_ms: 30_000,
            poll_interval_ms: 250,
            events_capacity: 1024,
        }
    }
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// `SPINDLE_CONFIG` names a YAML file to start from; `SPINDLE_LISTEN`
    /// (`host:port`) overrides the bind address.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] with an explicit variable lookup.
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut cfg = match lookup("SPINDLE_CONFIG") {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Some(listen) = lookup("SPINDLE_LISTEN") {
            let (host, port) = listen
                .rsplit_once(':')
                .with_context(|| format!("SPINDLE_LISTEN must be host:port, got {listen:?}"))?;
            cfg.host = host.trim_start_matches('[').trim_end_matches(']').to_string();
            cfg.port = port
                .parse()
                .with_context(|| format!("invalid port in SPINDLE_LISTEN: {port:?}"))?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        let cfg: Config = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_connections == 0 {
            bail!("max_connections must be greater than zero");
        }
        if self.read_buffer_max == 0 || self.write_buffer_max == 0 {
            bail!("buffer ceilings must be greater than zero");
        }
        if self.read_buffer_initial > self.read_buffer_max {
            bail!(
                "read_buffer_initial ({}) exceeds read_buffer_max ({})",
                self.read_buffer_initial,
                self.read_buffer_max
            );
        }
        if self.events_capacity == 0 {
            bail!("events_capacity must be greater than zero");
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_ms > 0).then(|| Duration::from_millis(self.idle_timeout_ms))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn buffer_limits(&self) -> BufferLimits {
        BufferLimits {
            read_initial: self.read_buffer_initial,
            read_max: self.read_buffer_max,
            write_max: self.write_buffer_max,
        }
    }
}
