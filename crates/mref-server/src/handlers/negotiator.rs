// ============================================
// File: crates/mref-server/src/handlers/negotiator.rs
// ============================================
//! # Connection Negotiation
//!
//! ## Creation Reason
//! Handles the three control exchanges on the wire: link requests,
//! unlink requests, and keepalive replies. Also the terminal stop for
//! anything the codec could not classify.
//!
//! ## Replies
//! ```text
//! CONN ──► ACKN (linked)  or  NACK (refused)
//! DISC ──► DISC (if the address was linked), silence otherwise
//! PONG ──► nothing (liveness stamp only)
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial negotiator

use std::net::SocketAddr;
use std::sync::Arc;

use mref_common::{Callsign, Module};
use mref_core::protocol::messages::{ACK_CONNECT, NACK_CONNECT, TAG_DISCONNECT};
use mref_transport::Transport;
use tracing::{debug, info};

use crate::services::gatekeeper::Gatekeeper;
use crate::services::registry::ClientRegistry;

/// Control-plane handler: link, unlink, keepalive replies.
pub struct ConnectionNegotiator {
    registry: Arc<ClientRegistry>,
    gatekeeper: Arc<dyn Gatekeeper>,
    modules: Vec<Module>,
}

impl ConnectionNegotiator {
    /// Creates a negotiator serving the configured modules.
    #[must_use]
    pub fn new(
        registry: Arc<ClientRegistry>,
        gatekeeper: Arc<dyn Gatekeeper>,
        modules: Vec<Module>,
    ) -> Self {
        Self {
            registry,
            gatekeeper,
            modules,
        }
    }

    /// Handles a link request. Replies are best effort; a lost ack is
    /// the client's problem to retry.
    pub async fn handle_connect(
        &self,
        callsign: &Callsign,
        module: Module,
        from: SocketAddr,
        transport: &dyn Transport,
    ) {
        let served = self.modules.contains(&module);
        if !served || !self.gatekeeper.may_link(callsign, from) {
            info!(%callsign, %module, %from, served, "link refused");
            if let Err(e) = transport.send_to(NACK_CONNECT, from).await {
                debug!(%from, error = %e, "nack send failed");
            }
            return;
        }

        // a relink from the same address replaces the old entry
        if let Some(existing) = self.registry.find_by_addr(from) {
            self.registry.remove(existing.id());
            info!(client = %existing.id(), %from, "stale link replaced");
        }

        if let Err(e) = transport.send_to(ACK_CONNECT, from).await {
            debug!(%from, error = %e, "ack send failed");
        }
        let client = self.registry.add(*callsign, from, module);
        info!(client = %client.id(), %callsign, %module, %from, "client linked");
    }

    /// Handles an unlink request. A known address gets its `DISC` echo;
    /// an unknown one gets silence.
    pub async fn handle_disconnect(
        &self,
        callsign: &Callsign,
        from: SocketAddr,
        transport: &dyn Transport,
    ) {
        let Some(client) = self.registry.find_by_addr(from) else {
            debug!(%callsign, %from, "unlink from unknown address ignored");
            return;
        };

        self.registry.remove(client.id());
        info!(client = %client.id(), %callsign, %from, "client unlinked");
        if let Err(e) = transport.send_to(TAG_DISCONNECT, from).await {
            debug!(%from, error = %e, "disc echo send failed");
        }
    }

    /// Handles a keepalive reply: stamps every matching client alive.
    pub fn handle_keepalive(&self, callsign: &Callsign, from: SocketAddr) {
        self.registry.mark_alive(callsign, from);
    }

    /// Terminal stop for unclassifiable datagrams.
    pub fn handle_unrecognized(&self, data: &[u8], from: SocketAddr) {
        debug!(%from, len = data.len(), data = %hex::encode(data), "unrecognized packet");
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mref_transport::TransportError;
    use parking_lot::Mutex;
    use std::time::Duration;

    /// Transport double that records every send.
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

    struct AllowAll;
    impl Gatekeeper for AllowAll {
        fn may_link(&self, _: &Callsign, _: SocketAddr) -> bool {
            true
        }
        fn may_transmit(&self, _: &Callsign, _: SocketAddr, _: Module) -> bool {
            true
        }
    }

    struct DenyAll;
    impl Gatekeeper for DenyAll {
        fn may_link(&self, _: &Callsign, _: SocketAddr) -> bool {
            false
        }
        fn may_transmit(&self, _: &Callsign, _: SocketAddr, _: Module) -> bool {
            false
        }
    }

    fn cs(text: &str) -> Callsign {
        Callsign::new(text).unwrap()
    }

    fn module(c: char) -> Module {
        Module::from_char(c).unwrap()
    }

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn negotiator(gatekeeper: Arc<dyn Gatekeeper>) -> (Arc<ClientRegistry>, ConnectionNegotiator) {
        let registry = Arc::new(ClientRegistry::new());
        let negotiator = ConnectionNegotiator::new(
            Arc::clone(&registry),
            gatekeeper,
            vec![module('A'), module('B')],
        );
        (registry, negotiator)
    }

    #[tokio::test]
    async fn test_connect_granted() {
        let (registry, negotiator) = negotiator(Arc::new(AllowAll));
        let transport = CaptureTransport::default();

        negotiator
            .handle_connect(&cs("N7TAE"), module('A'), addr(1000), &transport)
            .await;

        assert_eq!(registry.len(), 1);
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, ACK_CONNECT);
        assert_eq!(sent[0].1, addr(1000));
    }

    #[tokio::test]
    async fn test_connect_denied_by_gatekeeper() {
        let (registry, negotiator) = negotiator(Arc::new(DenyAll));
        let transport = CaptureTransport::default();

        negotiator
            .handle_connect(&cs("N7TAE"), module('A'), addr(1000), &transport)
            .await;

        assert!(registry.is_empty());
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, NACK_CONNECT);
    }

    #[tokio::test]
    async fn test_connect_to_unserved_module_nacked() {
        let (registry, negotiator) = negotiator(Arc::new(AllowAll));
        let transport = CaptureTransport::default();

        negotiator
            .handle_connect(&cs("N7TAE"), module('Z'), addr(1000), &transport)
            .await;

        assert!(registry.is_empty());
        assert_eq!(transport.sent()[0].0, NACK_CONNECT);
    }

    #[tokio::test]
    async fn test_relink_replaces_old_entry() {
        let (registry, negotiator) = negotiator(Arc::new(AllowAll));
        let transport = CaptureTransport::default();

        negotiator
            .handle_connect(&cs("N7TAE"), module('A'), addr(1000), &transport)
            .await;
        negotiator
            .handle_connect(&cs("N7TAE"), module('B'), addr(1000), &transport)
            .await;

        assert_eq!(registry.len(), 1);
        let client = registry.find_by_addr(addr(1000)).unwrap();
        assert_eq!(client.module(), module('B'));
    }

    #[tokio::test]
    async fn test_disconnect_known_and_unknown() {
        let (registry, negotiator) = negotiator(Arc::new(AllowAll));
        let transport = CaptureTransport::default();
        registry.add(cs("N7TAE"), addr(1000), module('A'));

        negotiator
            .handle_disconnect(&cs("N7TAE"), addr(1000), &transport)
            .await;
        assert!(registry.is_empty());
        assert_eq!(transport.sent().len(), 1);
        assert_eq!(transport.sent()[0].0, TAG_DISCONNECT);

        // unknown address: silence
        negotiator
            .handle_disconnect(&cs("N7TAE"), addr(2000), &transport)
            .await;
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_keepalive_stamps_matching_clients() {
        let (registry, negotiator) = negotiator(Arc::new(AllowAll));
        let client = registry.add(cs("N7TAE"), addr(1000), module('A'));

        std::thread::sleep(Duration::from_millis(20));
        negotiator.handle_keepalive(&cs("N7TAE"), addr(1000));
        assert!(!client.is_silent_for(Duration::from_millis(10)));
    }
}
