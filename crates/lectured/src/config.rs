//! Daemon configuration.
//!
//! Settings are layered, later layers winning:
//! 1. Built-in defaults
//! 2. TOML file (`~/.config/lecture/config.toml` unless a path is given)
//! 3. Environment variables (`LECTURE_ADDR`, `LECTURE_CAPACITY`)
//!
//! Command-line flags are applied on top by the binary.
//!
//! ```toml
//! roster_path = "/var/lib/lecture/roster.json"
//!
//! [lecture]
//! title = "C++ Programming"
//! description = "An advanced C++ programming class"
//! capacity = 10
//!
//! [server]
//! bind_addr = "127.0.0.1:8080"
//! tick_interval_ms = 1000
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use lecture_core::Lecture;

use crate::server::ServerConfig;

/// Environment variable overriding the server bind address.
pub const ENV_ADDR: &str = "LECTURE_ADDR";

/// Environment variable overriding the lecture capacity.
pub const ENV_CAPACITY: &str = "LECTURE_CAPACITY";

/// Top-level daemon configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub lecture: LectureConfig,
    pub server: ServerConfig,

    /// Where the roster is loaded from on start and saved to on exit
    pub roster_path: Option<PathBuf>,
}

/// The single lecture served by the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LectureConfig {
    pub title: String,
    pub description: String,
    pub capacity: usize,
}

impl Default for LectureConfig {
    fn default() -> Self {
        Self {
            title: "C++ Programming".to_string(),
            description: "An advanced C++ programming class".to_string(),
            capacity: 10,
        }
    }
}

impl LectureConfig {
    /// Builds an empty lecture from these settings.
    pub fn build(&self) -> Lecture {
        Lecture::new(&self.title, &self.description, self.capacity)
    }
}

impl DaemonConfig {
    /// Default config file location, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("lecture").join("config.toml"))
    }

    /// Loads the config file and applies environment overrides.
    ///
    /// An explicit `path` must exist. When `path` is `None` the default
    /// location is tried and silently skipped if absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::from_file(&default)?,
                _ => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_overrides_from(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parses a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Applies overrides read through `lookup`.
    ///
    /// `lookup` is `std::env::var` in production; tests pass a closure.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(ENV_ADDR) {
            self.server.bind_addr = parse_addr(&addr)?;
        }

        if let Some(raw) = lookup(ENV_CAPACITY) {
            self.lecture.capacity =
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: ENV_CAPACITY.to_string(),
                        value: raw.clone(),
                    })?;
        }

        Ok(())
    }
}

/// Parses a `host:port` socket address.
pub fn parse_addr(raw: &str) -> Result<SocketAddr, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidAddr(raw.to_string()))
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {error}", path.display())]
    Read { path: PathBuf, error: String },

    #[error("Failed to parse config {}: {error}", path.display())]
    Parse { path: PathBuf, error: String },

    #[error("Invalid socket address: {0}")]
    InvalidAddr(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DaemonConfig::default();
        assert_eq!(config.lecture.capacity, 10);
        assert_eq!(config.lecture.title, "C++ Programming");
        assert_eq!(config.server.bind_addr.to_string(), "127.0.0.1:8080");
        assert!(config.roster_path.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: DaemonConfig = toml::from_str(
            r#"
            [lecture]
            capacity = 30

            [server]
            tick_interval_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.lecture.capacity, 30);
        assert_eq!(config.lecture.title, "C++ Programming");
        assert_eq!(config.server.tick_interval_ms, 250);
        assert_eq!(config.server.max_connections, 64);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "roster_path = \"/tmp/roster.json\"\n\n[server]\nbind_addr = \"0.0.0.0:9000\""
        )
        .unwrap();

        let config = DaemonConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.bind_addr.port(), 9000);
        assert_eq!(config.roster_path, Some(PathBuf::from("/tmp/roster.json")));
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = DaemonConfig::from_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_from_file_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[lecture\ncapacity = ").unwrap();

        let err = DaemonConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = DaemonConfig::default();
        config
            .apply_overrides_from(lookup_from(&[
                (ENV_ADDR, "127.0.0.1:9100"),
                (ENV_CAPACITY, " 25 "),
            ]))
            .unwrap();

        assert_eq!(config.server.bind_addr.port(), 9100);
        assert_eq!(config.lecture.capacity, 25);
    }

    #[test]
    fn test_env_overrides_absent() {
        let mut config = DaemonConfig::default();
        config.apply_overrides_from(lookup_from(&[])).unwrap();
        assert_eq!(config, DaemonConfig::default());
    }

    #[test]
    fn test_env_override_invalid() {
        let mut config = DaemonConfig::default();
        let err = config
            .apply_overrides_from(lookup_from(&[(ENV_ADDR, "not-an-addr")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddr(_)));

        let err = config
            .apply_overrides_from(lookup_from(&[(ENV_CAPACITY, "ten")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_build_lecture() {
        let lecture = LectureConfig {
            capacity: 3,
            ..Default::default()
        }
        .build();
        assert_eq!(lecture.capacity(), 3);
        assert_eq!(lecture.occupancy().count, 0);
    }
}
