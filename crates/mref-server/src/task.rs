// ============================================
// File: crates/mref-server/src/task.rs
// ============================================
//! # Protocol Task
//!
//! ## Creation Reason
//! The single loop that runs the M17 module. One iteration (one tick)
//! does everything the protocol needs, so there is no locking between
//! intake, relay, and supervision: they are phases of the same task.
//!
//! ## Tick Anatomy
//! ```text
//! ┌── bounded receive (deadline = one voice-frame interval) ──┐
//! │     datagram? classify ──► negotiator / stream tracker    │
//! ├── sweep idle streams                                      │
//! ├── drain relay queue and fan out                           │
//! └── keepalive round, if the period elapsed ─────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! Nothing in this loop propagates a per-packet error. A bad datagram,
//! a refused stream, or a failed send costs at most one log line and
//! one iteration; the loop itself only exits on shutdown.
//!
//! ## Last Modified
//! v0.1.0 - Initial protocol task

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mref_core::{M17Codec, PacketKind};
use mref_transport::Transport;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::handlers::{ConnectionNegotiator, KeepaliveSupervisor, RelayDistributor};
use crate::services::StreamTracker;

/// Largest datagram the protocol can produce or accept, with room for
/// oversized garbage to be read and rejected in one receive.
const RECV_BUFFER_SIZE: usize = 1024;

/// The M17 protocol module's task.
pub struct M17Task {
    transport: Arc<dyn Transport>,
    codec: M17Codec,
    negotiator: ConnectionNegotiator,
    streams: StreamTracker,
    relay: RelayDistributor,
    keepalive: KeepaliveSupervisor,
    tick: Duration,
    shutdown: broadcast::Receiver<()>,
}

impl M17Task {
    /// Assembles the task from its pre-wired stages.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        codec: M17Codec,
        negotiator: ConnectionNegotiator,
        streams: StreamTracker,
        relay: RelayDistributor,
        keepalive: KeepaliveSupervisor,
        tick: Duration,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            transport,
            codec,
            negotiator,
            streams,
            relay,
            keepalive,
            tick,
            shutdown,
        }
    }

    /// Runs until shutdown is signalled.
    pub async fn run(mut self) {
        info!("m17 protocol task started");
        let mut buf = [0u8; RECV_BUFFER_SIZE];

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    info!("m17 protocol task stopping");
                    return;
                }
                received = self.transport.recv_deadline(&mut buf, self.tick) => {
                    match received {
                        Ok(Some((len, from))) => self.dispatch(&buf[..len], from).await,
                        Ok(None) => {}
                        Err(e) => warn!(error = %e, "receive failed"),
                    }
                }
            }

            self.streams.sweep();
            self.relay.drain(self.transport.as_ref()).await;
            self.keepalive.run_if_due(self.transport.as_ref()).await;
        }
    }

    async fn dispatch(&mut self, data: &[u8], from: SocketAddr) {
        match self.codec.classify_and_decode(data) {
            PacketKind::Audio(header, frame) => {
                self.streams.handle_audio(&header, &frame, from);
            }
            PacketKind::Connect(callsign, module) => {
                self.negotiator
                    .handle_connect(&callsign, module, from, self.transport.as_ref())
                    .await;
            }
            PacketKind::Disconnect(callsign) => {
                self.negotiator
                    .handle_disconnect(&callsign, from, self.transport.as_ref())
                    .await;
            }
            PacketKind::KeepAlive(callsign) => {
                self.negotiator.handle_keepalive(&callsign, from);
            }
            PacketKind::Unrecognized => {
                self.negotiator.handle_unrecognized(data, from);
            }
        }
    }
}

// ============================================
// Tests
// ============================================
