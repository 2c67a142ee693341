// ============================================
// File: crates/mref-server/src/handlers/keepalive.rs
// ============================================
//! # Keepalive Supervision
//!
//! ## Creation Reason
//! Dead peers must not accumulate in the registry. Once per period the
//! supervisor pings everyone and evicts whoever has been silent past
//! the timeout window.
//!
//! ## Eviction Rules
//! - every client gets a `PING` each round
//! - a transmitting master is tickled, never evicted mid-stream
//! - anyone else silent past the timeout gets a best-effort `DISC`
//!   and is removed
//!
//! ## Last Modified
//! v0.1.0 - Initial supervisor

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use mref_common::PeriodTimer;
use mref_core::protocol::messages::TAG_DISCONNECT;
use mref_core::M17Codec;
use mref_transport::Transport;
use tracing::{debug, info};

use crate::services::registry::ClientRegistry;

/// Periodic liveness checker, owned by the protocol task.
pub struct KeepaliveSupervisor {
    registry: Arc<ClientRegistry>,
    ping: Bytes,
    timer: PeriodTimer,
    timeout: Duration,
}

impl KeepaliveSupervisor {
    /// Creates a supervisor with the given cadence and eviction window.
    #[must_use]
    pub fn new(
        codec: &M17Codec,
        registry: Arc<ClientRegistry>,
        period: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            registry,
            ping: codec.encode_ping(),
            timer: PeriodTimer::new(period),
            timeout,
        }
    }

    /// Runs one round if the period has elapsed. Called every tick.
    pub async fn run_if_due(&mut self, transport: &dyn Transport) {
        if self.timer.due() {
            self.run(transport).await;
        }
    }

    /// One unconditional keepalive round.
    pub async fn run(&mut self, transport: &dyn Transport) {
        for client in self.registry.all() {
            if let Err(e) = transport.send_to(&self.ping, client.addr()).await {
                debug!(client = %client.id(), error = %e, "ping send failed");
            }

            if client.master_of().is_some() {
                // audio is proof of life; don't let a long transmission
                // look like silence
                client.heard();
                continue;
            }

            if client.is_silent_for(self.timeout) {
                if let Err(e) = transport.send_to(TAG_DISCONNECT, client.addr()).await {
                    debug!(client = %client.id(), error = %e, "eviction disc send failed");
                }
                self.registry.remove(client.id());
                info!(
                    client = %client.id(),
                    callsign = %client.callsign(),
                    addr = %client.addr(),
                    "client evicted after keepalive timeout"
                );
            }
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mref_common::{Callsign, Module, StreamId};
    use mref_core::protocol::messages::TAG_PING;
    use mref_transport::TransportError;
    use parking_lot::Mutex;
    use std::net::SocketAddr;

    #[derive(Default)]
    struct CaptureTransport {
        sent: Mutex<Vec<(Vec<u8>, SocketAddr)>>,
    }

    impl CaptureTransport {
        fn sent(&self) -> Vec<(Vec<u8>, SocketAddr)> {
            self.sent.lock().clone()
        }
    }

    #[async_trait]
    impl Transport for CaptureTransport {
        async fn send_to(&self, data: &[u8], addr: SocketAddr) -> Result<(), TransportError> {
            self.sent.lock().push((data.to_vec(), addr));
            Ok(())
        }

        async fn recv_deadline(
            &self,
            _buf: &mut [u8],
            _deadline: Duration,
        ) -> Result<Option<(usize, SocketAddr)>, TransportError> {
            Ok(None)
        }

        fn local_addr(&self) -> Result<SocketAddr, TransportError> {
            Ok(SocketAddr::from(([127, 0, 0, 1], 17000)))
        }
    }

    fn cs(text: &str) -> Callsign {
        Callsign::new(text).unwrap()
    }

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn supervisor(
        timeout: Duration,
    ) -> (Arc<ClientRegistry>, KeepaliveSupervisor) {
        let registry = Arc::new(ClientRegistry::new());
        let codec = M17Codec::new(cs("MREF17"));
        let supervisor = KeepaliveSupervisor::new(
            &codec,
            Arc::clone(&registry),
            Duration::from_secs(3),
            timeout,
        );
        (registry, supervisor)
    }

    #[tokio::test]
    async fn test_everyone_gets_pinged() {
        let (registry, mut supervisor) = supervisor(Duration::from_secs(30));
        registry.add(cs("N7TAE"), addr(1000), Module::from_char('A').unwrap());
        registry.add(cs("LX3JL"), addr(1001), Module::from_char('B').unwrap());

        let transport = CaptureTransport::default();
        supervisor.run(&transport).await;

        let pings: Vec<_> = transport
            .sent()
            .into_iter()
            .filter(|(data, _)| data.starts_with(TAG_PING))
            .collect();
        assert_eq!(pings.len(), 2);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_silent_client_evicted_with_disc() {
        let (registry, mut supervisor) = supervisor(Duration::from_millis(10));
        let client = registry.add(cs("N7TAE"), addr(1000), Module::from_char('A').unwrap());

        std::thread::sleep(Duration::from_millis(30));
        let transport = CaptureTransport::default();
        supervisor.run(&transport).await;

        assert!(registry.is_empty());
        assert!(registry.get(client.id()).is_none());
        let discs: Vec<_> = transport
            .sent()
            .into_iter()
            .filter(|(data, _)| data == TAG_DISCONNECT)
            .collect();
        assert_eq!(discs.len(), 1);
        assert_eq!(discs[0].1, addr(1000));
    }

    #[tokio::test]
    async fn test_master_is_never_evicted() {
        let (registry, mut supervisor) = supervisor(Duration::from_millis(10));
        let client = registry.add(cs("N7TAE"), addr(1000), Module::from_char('A').unwrap());
        client.set_master_of(Some(StreamId::from_bytes([1, 2])));

        std::thread::sleep(Duration::from_millis(30));
        let transport = CaptureTransport::default();
        supervisor.run(&transport).await;

        assert_eq!(registry.len(), 1);
        // and the tickle reset the clock
        assert!(!client.is_silent_for(Duration::from_millis(10)));
    }

    #[tokio::test]
    async fn test_fresh_client_survives() {
        let (registry, mut supervisor) = supervisor(Duration::from_secs(30));
        registry.add(cs("N7TAE"), addr(1000), Module::from_char('A').unwrap());

        let transport = CaptureTransport::default();
        supervisor.run(&transport).await;
        assert_eq!(registry.len(), 1);
    }
}
