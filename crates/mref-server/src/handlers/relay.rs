// ============================================
// File: crates/mref-server/src/handlers/relay.rs
// ============================================
//! # Relay Distribution
//!
//! ## Creation Reason
//! The outbound half of the reflector: drains the relay queue once per
//! tick, re-encodes frames around the cached stream header, and fans
//! each one out to the module's listeners.
//!
//! ## Main Functionality
//! ```text
//! RelayQueue ──drain──► headers: refresh the module encode cache
//!                       frames:  encode (second-of-pair or last only)
//!                                └──► every linked client that is not
//!                                     currently transmitting
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The sequence counter is post-incremented: the first relayed frame
//!   of a transmission carries number 0
//! - Inbound frames arrive in duplicate pairs; encoding only the
//!   flagged copies yields exactly one outbound datagram per inbound
//!   one
//!
//! ## Last Modified
//! v0.1.0 - Initial distributor

use std::collections::HashMap;
use std::sync::Arc;

use mref_common::Module;
use mref_core::protocol::messages::SEQUENCE_MASK;
use mref_core::{DvFramePacket, DvHeaderPacket, DvPacket, M17Codec};
use mref_transport::Transport;
use tracing::debug;

use crate::services::registry::ClientRegistry;
use crate::services::router::RelayQueue;

/// Per-module encoding state: the stream header to rebuild frames
/// around and the outbound sequence counter.
#[derive(Debug)]
struct ModuleEncodeCache {
    header: DvHeaderPacket,
    sequence: u16,
}

/// Fan-out stage, owned by the protocol task.
pub struct RelayDistributor {
    codec: M17Codec,
    registry: Arc<ClientRegistry>,
    queue: Arc<RelayQueue>,
    caches: HashMap<Module, ModuleEncodeCache>,
}

impl RelayDistributor {
    /// Creates a distributor over the shared queue and registry.
    #[must_use]
    pub fn new(codec: M17Codec, registry: Arc<ClientRegistry>, queue: Arc<RelayQueue>) -> Self {
        Self {
            codec,
            registry,
            queue,
            caches: HashMap::new(),
        }
    }

    /// Drains everything queued since the previous tick and sends it.
    /// Per-client send failures are logged and skipped; one slow or
    /// vanished peer never stalls the rest of the module.
    pub async fn drain(&mut self, transport: &dyn Transport) {
        let packets = self.queue.drain();
        for packet in packets {
            match packet {
                DvPacket::Header(header) => {
                    // new transmission: counter restarts at zero
                    self.caches.insert(
                        header.module(),
                        ModuleEncodeCache {
                            header,
                            sequence: 0,
                        },
                    );
                }
                DvPacket::Frame(frame) => self.relay_frame(&frame, transport).await,
            }
        }
    }

    async fn relay_frame(&mut self, frame: &DvFramePacket, transport: &dyn Transport) {
        if !frame.is_second() && !frame.is_last() {
            return;
        }

        let Some((module, cache)) = self
            .caches
            .iter_mut()
            .find(|(_, c)| c.header.stream_id() == frame.stream_id())
        else {
            // header never arrived (stream refused); drop quietly
            return;
        };
        let module = *module;

        let sequence = cache.sequence;
        cache.sequence = (cache.sequence + 1) & SEQUENCE_MASK;
        let wire = self
            .codec
            .encode_frame(&cache.header, frame, sequence, frame.is_last());

        for client in self.registry.linked_to(module) {
            // half-duplex: a transmitting client cannot receive, no
            // matter which stream or module it is keyed up on
            if client.master_of().is_some() {
                continue;
            }
            if let Err(e) = transport.send_to(&wire, client.addr()).await {
                debug!(client = %client.id(), addr = %client.addr(), error = %e, "relay send failed");
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
    use mref_common::{Callsign, StreamId};
    use mref_core::dv::{NONCE_SIZE, PAYLOAD_SIZE};
    use mref_core::protocol::messages::{FRAME_SIZE, OFFSET_FRAME_NUMBER};
    use mref_core::CodecKind;
    use mref_transport::TransportError;
    use parking_lot::Mutex;
    use std::net::SocketAddr;
    use std::time::Duration;

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

    fn module(c: char) -> Module {
        Module::from_char(c).unwrap()
    }

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn header(m: char, stream: [u8; 2]) -> DvHeaderPacket {
        DvHeaderPacket::new(
            cs("N7TAE"),
            cs("MREF17").with_module(module(m)),
            module(m),
            StreamId::from_bytes(stream),
            CodecKind::Codec2_3200,
        )
    }

    fn frame(stream: [u8; 2], second: bool, last: bool) -> DvFramePacket {
        let f = DvFramePacket::new(
            StreamId::from_bytes(stream),
            [0u8; NONCE_SIZE],
            [0x55u8; PAYLOAD_SIZE],
            last,
        );
        if second {
            f.as_second()
        } else {
            f
        }
    }

    fn distributor() -> (Arc<ClientRegistry>, Arc<RelayQueue>, RelayDistributor) {
        let registry = Arc::new(ClientRegistry::new());
        let queue = Arc::new(RelayQueue::new());
        let relay = RelayDistributor::new(
            M17Codec::new(cs("MREF17")),
            Arc::clone(&registry),
            Arc::clone(&queue),
        );
        (registry, queue, relay)
    }

    #[tokio::test]
    async fn test_fan_out_skips_master() {
        let (registry, queue, mut relay) = distributor();
        let master = registry.add(cs("N7TAE"), addr(1000), module('A'));
        registry.add(cs("LX3JL"), addr(1001), module('A'));
        registry.add(cs("F4ABC"), addr(1002), module('A'));
        master.set_master_of(Some(StreamId::from_bytes([1, 2])));

        queue.push(DvPacket::Header(header('A', [1, 2])));
        queue.push(DvPacket::Frame(frame([1, 2], true, false)));

        let transport = CaptureTransport::default();
        relay.drain(&transport).await;

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        let targets: Vec<u16> = sent.iter().map(|(_, a)| a.port()).collect();
        assert!(targets.contains(&1001));
        assert!(targets.contains(&1002));
        assert!(!targets.contains(&1000));
    }

    #[tokio::test]
    async fn test_client_transmitting_elsewhere_is_skipped() {
        let (registry, queue, mut relay) = distributor();
        // linked to A but keyed up on some other stream: half-duplex,
        // it cannot receive module-A audio right now
        let busy = registry.add(cs("N7TAE"), addr(1000), module('A'));
        busy.set_master_of(Some(StreamId::from_bytes([9, 9])));
        registry.add(cs("LX3JL"), addr(1001), module('A'));

        queue.push(DvPacket::Header(header('A', [1, 2])));
        queue.push(DvPacket::Frame(frame([1, 2], true, false)));

        let transport = CaptureTransport::default();
        relay.drain(&transport).await;

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, addr(1001));
    }

    #[tokio::test]
    async fn test_only_flagged_copies_are_encoded() {
        let (registry, queue, mut relay) = distributor();
        registry.add(cs("LX3JL"), addr(1001), module('A'));

        queue.push(DvPacket::Header(header('A', [1, 2])));
        queue.push(DvPacket::Frame(frame([1, 2], false, false)));
        queue.push(DvPacket::Frame(frame([1, 2], true, false)));

        let transport = CaptureTransport::default();
        relay.drain(&transport).await;

        // the unflagged first copy produced nothing
        assert_eq!(transport.sent().len(), 1);
        assert_eq!(transport.sent()[0].0.len(), FRAME_SIZE);
    }

    #[tokio::test]
    async fn test_sequence_counts_up_and_restarts_per_header() {
        let (registry, queue, mut relay) = distributor();
        registry.add(cs("LX3JL"), addr(1001), module('A'));
        let transport = CaptureTransport::default();

        queue.push(DvPacket::Header(header('A', [1, 2])));
        queue.push(DvPacket::Frame(frame([1, 2], true, false)));
        queue.push(DvPacket::Frame(frame([1, 2], true, false)));
        relay.drain(&transport).await;

        let fnum = |bytes: &[u8]| {
            u16::from_be_bytes([bytes[OFFSET_FRAME_NUMBER], bytes[OFFSET_FRAME_NUMBER + 1]])
        };
        let sent = transport.sent();
        assert_eq!(fnum(&sent[0].0), 0);
        assert_eq!(fnum(&sent[1].0), 1);

        // a fresh header restarts the counter
        queue.push(DvPacket::Header(header('A', [3, 4])));
        queue.push(DvPacket::Frame(frame([3, 4], true, false)));
        relay.drain(&transport).await;
        let sent = transport.sent();
        assert_eq!(fnum(&sent[2].0), 0);
    }

    #[tokio::test]
    async fn test_frame_without_header_is_dropped() {
        let (registry, queue, mut relay) = distributor();
        registry.add(cs("LX3JL"), addr(1001), module('A'));

        queue.push(DvPacket::Frame(frame([9, 9], true, false)));
        let transport = CaptureTransport::default();
        relay.drain(&transport).await;
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_last_frame_carries_the_flag() {
        let (registry, queue, mut relay) = distributor();
        registry.add(cs("LX3JL"), addr(1001), module('A'));

        queue.push(DvPacket::Header(header('A', [1, 2])));
        // last but not second: still encoded
        queue.push(DvPacket::Frame(frame([1, 2], false, true)));

        let transport = CaptureTransport::default();
        relay.drain(&transport).await;
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        let fnum =
            u16::from_be_bytes([sent[0].0[OFFSET_FRAME_NUMBER], sent[0].0[OFFSET_FRAME_NUMBER + 1]]);
        assert_eq!(fnum & 0x8000, 0x8000);
    }
}
