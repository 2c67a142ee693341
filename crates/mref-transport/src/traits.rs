// ============================================
// File: crates/mref-transport/src/traits.rs
// ============================================
//! # Transport Abstraction
//!
//! ## Creation Reason
//! The protocol task should not care whether datagrams come from a real
//! UDP socket or a test double. This trait is that seam.
//!
//! ## ⚠️ Important Note for Next Developer
//! `recv_deadline` returning `Ok(None)` is the normal idle path, not an
//! error: the protocol task uses the deadline as its tick and expects
//! to see `None` whenever the channel is quiet.
//!
//! ## Last Modified
//! v0.1.0 - Initial trait definition

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;

/// A bidirectional datagram channel.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one datagram to `addr`.
    ///
    /// # Errors
    /// Returns `TransportError::Io` if the send fails.
    async fn send_to(&self, data: &[u8], addr: SocketAddr) -> Result<(), TransportError>;

    /// Waits up to `deadline` for one datagram.
    ///
    /// # Returns
    /// - `Ok(Some((len, addr)))` when a datagram arrived
    /// - `Ok(None)` when the deadline passed with nothing to read
    ///
    /// # Errors
    /// Returns `TransportError::Io` if the receive itself fails.
    async fn recv_deadline(
        &self,
        buf: &mut [u8],
        deadline: Duration,
    ) -> Result<Option<(usize, SocketAddr)>, TransportError>;

    /// The locally bound address.
    ///
    /// # Errors
    /// Returns `TransportError::Io` if the socket cannot report it.
    fn local_addr(&self) -> Result<SocketAddr, TransportError>;
}
