use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Broadcast channel capacity; a subscriber that falls further behind
    /// than this receives a `reconnect` hint instead of the missed frames.
    pub channel_capacity: usize,
    /// Seconds between generated operations.
    pub broadcast_interval_secs: u64,
    /// How long a soft-deleted event stays in the store before it is purged.
    pub retention_secs: u64,
    /// Number of sample events seeded at startup.
    pub seed_events: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            channel_capacity: default_channel_capacity(),
            broadcast_interval_secs: default_broadcast_interval(),
            retention_secs: default_retention(),
            seed_events: default_seed_events(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StreamConfig {
    /// Endpoint the client subscribes to.
    pub url: String,
    /// Fixed delay before the transport re-opens a dropped connection.
    /// There is deliberately no backoff; this mirrors EventSource semantics.
    pub retry_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: default_stream_url(),
            retry_ms: default_retry_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub stream: StreamConfig,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl ServerConfig {
    /// Full bind address, e.g. `"127.0.0.1:8080"`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn broadcast_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.broadcast_interval_secs)
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.retention_secs as i64)
    }
}

impl StreamConfig {
    pub fn retry_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.retry_ms)
    }
}

// ---------------------------------------------------------------------------
// Serde defaults
// ---------------------------------------------------------------------------

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_channel_capacity() -> usize {
    100
}

fn default_broadcast_interval() -> u64 {
    10
}

fn default_retention() -> u64 {
    5
}

fn default_seed_events() -> usize {
    10
}

fn default_stream_url() -> String {
    "http://127.0.0.1:8080/api/events/stream".to_string()
}

fn default_retry_ms() -> u64 {
    3000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_client_at_default_server() {
        let cfg = AppConfig::default();
        assert!(cfg.stream.url.contains(&cfg.server.port.to_string()));
    }

    #[test]
    fn addr_joins_bind_and_port() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn retry_delay_is_milliseconds() {
        let cfg = StreamConfig {
            url: "http://x/stream".into(),
            retry_ms: 250,
        };
        assert_eq!(cfg.retry_delay(), std::time::Duration::from_millis(250));
    }
}
