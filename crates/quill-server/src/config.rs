//! Runtime configuration.
//!
//! The database path is the one value the application genuinely depends on;
//! the bind address and logging settings exist for operability. Values come
//! from an optional TOML file, and `QUILL_*` environment variables take
//! precedence over whatever the file says.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use thiserror::Error;

/// Runtime configuration, flat on purpose: five values, no nesting.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Path to the SQLite database file. Read once at startup; every unit
    /// of work opens its connection from this value.
    pub database: String,

    /// Host address to bind to.
    pub host: IpAddr,

    /// Port to listen on.
    pub port: u16,

    /// Log level filter (e.g. "info" or "quill_server=debug,info").
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: "quill.db".to_string(),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5000,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file could not be parsed.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override was set but holds an unusable value.
    #[error("invalid value for {var}: {value:?}")]
    BadEnvValue { var: &'static str, value: String },
}

impl Config {
    /// Loads the configuration: file values (when the file exists) overlaid
    /// with `QUILL_DATABASE`, `QUILL_HOST`, `QUILL_PORT`, `QUILL_LOG_LEVEL`,
    /// and `QUILL_LOG_JSON`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or
    /// parsed, or if a set environment override does not parse. A missing
    /// file is not an error; defaults apply.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// The socket address the server binds to.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path, "config file not found, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::FileRead {
                path: path.to_string(),
                source,
            }),
        }
    }

    /// Applies `QUILL_*` overrides supplied by `lookup`. A set-but-garbled
    /// value is an error, not a silent fallback to the file value.
    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(database) = lookup("QUILL_DATABASE") {
            self.database = database;
        }
        if let Some(host) = lookup("QUILL_HOST") {
            self.host = host.parse().map_err(|_| ConfigError::BadEnvValue {
                var: "QUILL_HOST",
                value: host,
            })?;
        }
        if let Some(port) = lookup("QUILL_PORT") {
            self.port = port.parse().map_err(|_| ConfigError::BadEnvValue {
                var: "QUILL_PORT",
                value: port,
            })?;
        }
        if let Some(level) = lookup("QUILL_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(json) = lookup("QUILL_LOG_JSON") {
            self.log_json = matches!(json.as_str(), "1" | "true");
        }
        Ok(())
    }
}
