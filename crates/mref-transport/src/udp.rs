// ============================================
// File: crates/mref-transport/src/udp.rs
// ============================================
//! # UDP Transport
//!
//! ## Creation Reason
//! The reflector speaks raw UDP datagrams. This wraps socket creation
//! (bind-time options via socket2) and the tokio socket behind the
//! `Transport` trait.
//!
//! ## Main Functionality
//! - `UdpTransport::bind`: SO_REUSEADDR, dual-stack for v6 binds,
//!   nonblocking, then handed to tokio
//! - bounded receive via `tokio::time::timeout`
//!
//! ## Last Modified
//! v0.1.0 - Initial UDP transport

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tracing::debug;

use crate::error::TransportError;
use crate::traits::Transport;

/// A bound UDP socket implementing [`Transport`].
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Binds a UDP socket on `addr`.
    ///
    /// IPv6 binds accept IPv4 traffic too (`only_v6(false)`), so one
    /// socket on `[::]` serves both families.
    ///
    /// # Errors
    /// Returns `TransportError::Bind` if any step of socket setup
    /// fails.
    pub fn bind(addr: SocketAddr) -> Result<Self, TransportError> {
        let domain = Domain::for_address(addr);
        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))
            .map_err(|e| TransportError::bind(addr, e))?;

        socket
            .set_reuse_address(true)
            .map_err(|e| TransportError::bind(addr, e))?;
        if addr.is_ipv6() {
            socket
                .set_only_v6(false)
                .map_err(|e| TransportError::bind(addr, e))?;
        }
        socket
            .set_nonblocking(true)
            .map_err(|e| TransportError::bind(addr, e))?;
        socket
            .bind(&addr.into())
            .map_err(|e| TransportError::bind(addr, e))?;

        let socket = UdpSocket::from_std(socket.into())
            .map_err(|e| TransportError::bind(addr, e))?;

        debug!(%addr, "udp socket bound");
        Ok(Self { socket })
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send_to(&self, data: &[u8], addr: SocketAddr) -> Result<(), TransportError> {
        self.socket.send_to(data, addr).await?;
        Ok(())
    }

    async fn recv_deadline(
        &self,
        buf: &mut [u8],
        deadline: Duration,
    ) -> Result<Option<(usize, SocketAddr)>, TransportError> {
        match tokio::time::timeout(deadline, self.socket.recv_from(buf)).await {
            Ok(Ok((len, addr))) => Ok(Some((len, addr))),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Ok(None),
        }
    }

    fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.socket.local_addr()?)
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn any_local() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    #[tokio::test]
    async fn test_bind_and_local_addr() {
        let transport = UdpTransport::bind(any_local()).unwrap();
        let addr = transport.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_send_and_receive() {
        let a = UdpTransport::bind(any_local()).unwrap();
        let b = UdpTransport::bind(any_local()).unwrap();
        let b_addr = b.local_addr().unwrap();

        a.send_to(b"M17 hello", b_addr).await.unwrap();

        let mut buf = [0u8; 64];
        let received = b
            .recv_deadline(&mut buf, Duration::from_secs(1))
            .await
            .unwrap();
        let (len, from) = received.expect("datagram should arrive");
        assert_eq!(&buf[..len], b"M17 hello");
        assert_eq!(from, a.local_addr().unwrap());
    }

    #[tokio::test]
    async fn test_recv_deadline_elapses_quietly() {
        let transport = UdpTransport::bind(any_local()).unwrap();
        let mut buf = [0u8; 64];
        let result = transport
            .recv_deadline(&mut buf, Duration::from_millis(20))
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
