//! Error types for LinkShield

use thiserror::Error;

/// Main error type for LinkShield operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to open DRM device: {0}")]
    DeviceOpen(String),

    #[error("DRM command {command} failed: {source}")]
    Command {
        command: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using LinkShield's Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a driver command error
    pub fn command(command: &'static str, source: std::io::Error) -> Self {
        Error::Command { command, source }
    }
}
