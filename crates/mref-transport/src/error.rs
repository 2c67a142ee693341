// ============================================
// File: crates/mref-transport/src/error.rs
// ============================================
//! # Transport Error Types
//!
//! ## Creation Reason
//! Socket-layer failures, separated so the server crate can tell a
//! fatal bind problem from a transient send/receive hiccup.
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors produced by the transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The listen socket could not be created or bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that was requested.
        addr: SocketAddr,
        /// The underlying socket error.
        source: io::Error,
    },

    /// A send or receive operation failed.
    #[error("socket io error: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    /// Creates a `Bind` error.
    #[must_use]
    pub const fn bind(addr: SocketAddr, source: io::Error) -> Self {
        Self::Bind { addr, source }
    }

    /// Bind failures are fatal: the daemon cannot run without its
    /// socket. Everything else is retried on the next tick.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Bind { .. })
    }
}
