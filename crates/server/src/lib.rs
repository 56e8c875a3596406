//! Static bundle server: serves the built calculator app, falls back to the
//! entry document for client-side routes, and compresses text responses.

pub mod compress;
pub mod http;
pub mod mime;
pub mod server;
pub mod static_files;

pub use server::{respond, ServerMetrics, StaticServer};

use std::fmt;

#[derive(Debug)]
pub enum ServerError {
    /// The listen address could not be bound (port in use, permissions).
    Bind { addr: String, message: String },
    /// Socket setup failed after binding.
    Io(String),
    /// The accept loop ended without a stop request.
    ListenerStopped(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind { addr, message } => write!(f, "cannot bind {addr}: {message}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::ListenerStopped(msg) => write!(f, "server stopped: {msg}"),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<std::io::Error> for ServerError {
    fn from(e: std::io::Error) -> Self {
        ServerError::Io(e.to_string())
    }
}
