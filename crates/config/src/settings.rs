// Static server settings
// Resolved from flags / environment; there is no settings file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ConfigError;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_STATIC_DIR: &str = "dist";
pub const DEFAULT_INDEX_FILE: &str = "index.html";

/// Bodies smaller than this are sent uncompressed.
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 1024;

/// Connections allowed per available core.
const CONNECTIONS_PER_CORE: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerSettings {
    /// Listen port (binds all interfaces)
    pub port: u16,

    /// Directory holding the built application bundle
    pub static_dir: PathBuf,

    /// SPA entry document, relative to `static_dir`
    pub index_file: String,

    /// gzip/deflate compressible responses
    pub compression: bool,

    pub compression_threshold: usize,

    /// Concurrent connection cap; extra connections get 503
    pub max_connections: usize,

    /// Per-connection read timeout in milliseconds
    pub read_timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            index_file: DEFAULT_INDEX_FILE.to_string(),
            compression: true,
            compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
            max_connections: default_max_connections(),
            read_timeout_ms: 10_000,
        }
    }
}

/// Unparsed values as clap hands them over (flag or its env fallback).
#[derive(Debug, Clone, Default)]
pub struct RawSettings {
    pub port: Option<String>,
    pub static_dir: Option<PathBuf>,
    pub max_connections: Option<String>,
    pub no_compression: bool,
}

impl ServerSettings {
    /// Parse and default each raw value. Does not touch the filesystem.
    pub fn from_raw(raw: RawSettings) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            port: parse_port(raw.port.as_deref())?,
            static_dir: raw
                .static_dir
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or(defaults.static_dir),
            max_connections: parse_max_connections(raw.max_connections.as_deref())?,
            compression: !raw.no_compression,
            ..defaults
        })
    }

    /// Absolute-or-relative path of the SPA entry document.
    pub fn index_path(&self) -> PathBuf {
        self.static_dir.join(&self.index_file)
    }

    /// Fail early if the bundle directory is missing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !Path::new(&self.static_dir).is_dir() {
            return Err(ConfigError::StaticDirMissing(self.static_dir.clone()));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

/// Unset or empty → default port. Anything else must be a valid u16.
pub fn parse_port(raw: Option<&str>) -> Result<u16, ConfigError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(DEFAULT_PORT),
        Some(s) => s.parse::<u16>().map_err(|_| ConfigError::InvalidPort(s.to_string())),
    }
}

/// Unset, empty, or `max` → scale with available cores. Zero is rejected.
pub fn parse_max_connections(raw: Option<&str>) -> Result<usize, ConfigError> {
    match raw.map(str::trim) {
        None | Some("") | Some("max") => Ok(default_max_connections()),
        Some(s) => match s.parse::<usize>() {
            Ok(0) | Err(_) => Err(ConfigError::InvalidMaxConnections(s.to_string())),
            Ok(n) => Ok(n),
        },
    }
}

pub fn default_max_connections() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cores * CONNECTIONS_PER_CORE
}
