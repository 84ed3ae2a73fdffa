//! Server configuration, read from a TOML file.
//!
//! ```toml
//! [server]
//! hostname = "0.0.0.0"
//! port = 8080
//!
//! [log]
//! level = "debug"
//! ```
//!
//! Every field is optional. A port of `0` means the standard http port.

use crate::Error;
use serde::Deserialize;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;

const DEFAULT_PORT: u16 = 80;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub log: LogConfig,
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub hostname: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            hostname: "127.0.0.1".to_owned(),
            port: 0,
        }
    }
}

impl ServerConfig {
    /// The port to listen on, with `0` replaced by the standard http port.
    pub fn effective_port(&self) -> u16 {
        if self.port == 0 {
            DEFAULT_PORT
        } else {
            self.port
        }
    }

    /// Resolves `hostname:port` to the first matching socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, Error> {
        (self.hostname.as_str(), self.effective_port())
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| Error::new(format!("Can't resolve listen address `{}`", self.hostname)))
    }
}

/// Logging settings. `RUST_LOG` takes precedence over `level` when it is set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig { level: "info".to_owned() }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Config, Error> {
        Ok(toml::from_str(s)?)
    }

    /// Loads the configuration from a TOML file. Failing to read or parse it is fatal at startup.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
        let content = std::fs::read_to_string(path)?;
        Config::from_toml_str(&content)
    }
}
