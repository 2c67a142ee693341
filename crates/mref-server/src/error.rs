// ============================================
// File: crates/mref-server/src/error.rs
// ============================================
//! # Server Error Types
//!
//! ## Creation Reason
//! Daemon-level failures: configuration problems, socket setup, and
//! the shutdown path. Per-packet problems never surface here; they are
//! contained inside the protocol task.
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use mref_common::CommonError;
use mref_transport::TransportError;
use thiserror::Error;

/// Errors that can stop the daemon.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configuration file is missing, unreadable, or invalid.
    #[error("configuration error: {message}")]
    Config {
        /// What is wrong with it.
        message: String,
    },

    /// A foundation type in the configuration failed validation.
    #[error(transparent)]
    Common(#[from] CommonError),

    /// The transport layer failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Filesystem or signal handling failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Creates a `Config` error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ServerError::config("modules must not be empty");
        assert_eq!(
            err.to_string(),
            "configuration error: modules must not be empty"
        );
    }
}
