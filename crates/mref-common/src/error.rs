// ============================================
// File: crates/mref-common/src/error.rs
// ============================================
//! # Common Error Types
//!
//! ## Creation Reason
//! Shared error surface for the foundation crate: validation failures
//! of the core identifier types.
//!
//! ## Main Functionality
//! - `CommonError` enum with convenience constructors
//! - Classification helpers used by upper layers to decide logging
//!   severity
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

/// Errors produced by the foundation types.
#[derive(Debug, Error)]
pub enum CommonError {
    /// A callsign failed validation or wire decoding.
    #[error("invalid callsign: {reason}")]
    InvalidCallsign {
        /// What made it invalid.
        reason: String,
    },

    /// A module letter was out of range.
    #[error("invalid module byte: 0x{value:02x}")]
    InvalidModule {
        /// The offending byte.
        value: u8,
    },

    /// A buffer had the wrong size for the type it should decode to.
    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Required size.
        expected: usize,
        /// Provided size.
        actual: usize,
    },
}

impl CommonError {
    /// Creates an `InvalidCallsign` error.
    pub fn invalid_callsign(reason: impl Into<String>) -> Self {
        Self::InvalidCallsign {
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidModule` error.
    #[must_use]
    pub const fn invalid_module(value: u8) -> Self {
        Self::InvalidModule { value }
    }

    /// Creates an `InvalidLength` error.
    #[must_use]
    pub const fn invalid_length(expected: usize, actual: usize) -> Self {
        Self::InvalidLength { expected, actual }
    }

    /// All common errors describe bad input from a peer, never an
    /// internal fault: callers log them at debug and move on.
    #[must_use]
    pub const fn is_peer_error(&self) -> bool {
        true
    }
}
