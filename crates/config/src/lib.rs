// Configuration loading

pub mod settings;

pub use settings::{RawSettings, ServerSettings};

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// PORT is set but not a valid port number.
    InvalidPort(String),
    /// Connection cap is zero or not a number.
    InvalidMaxConnections(String),
    /// The static bundle directory does not exist.
    StaticDirMissing(PathBuf),
    /// Settings could not be serialized.
    Serialize(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPort(value) => write!(f, "invalid port: '{value}'"),
            Self::InvalidMaxConnections(value) => {
                write!(f, "invalid max connections: '{value}' (expected a positive number or 'max')")
            }
            Self::StaticDirMissing(path) => {
                write!(f, "static directory not found: {}", path.display())
            }
            Self::Serialize(msg) => write!(f, "cannot serialize settings: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
