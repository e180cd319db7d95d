//! Broadcast server configuration

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default listening address (loopback, port 8080).
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Broadcast server configuration options.
///
/// Durations are stored as milliseconds so the struct maps directly onto
/// a TOML `[server]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Interval between status pushes on each connection
    pub tick_interval_ms: u64,

    /// A single status write must complete within this time
    pub write_timeout_ms: u64,

    /// Maximum concurrent listener connections (0 = unlimited)
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            tick_interval_ms: 1000,
            write_timeout_ms: 5000,
            max_connections: 64,
        }
    }
}

impl ServerConfig {
    /// Create a config bound to `bind_addr` with default settings.
    pub fn with_addr(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Default::default()
        }
    }

    pub fn tick_interval(&self) -> Duration {
        // A zero interval would make tokio's interval panic
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.write_timeout(), Duration::from_secs(5));
        assert_eq!(config.max_connections, 64);
    }

    #[test]
    fn test_zero_tick_is_clamped() {
        let config = ServerConfig {
            tick_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.tick_interval(), Duration::from_millis(1));
    }
}
