// ============================================
// File: crates/mref-server/src/services/streams.rs
// ============================================
//! # Stream Lifecycle
//!
//! ## Creation Reason
//! Tracks which transmissions are live from the protocol task's point
//! of view: opens on the first authorized header, tickles on every
//! packet, closes on the last-frame flag or idleness.
//!
//! ## State Machine
//! ```text
//!            authorized header
//! (no stream) ───────────────► (open) ──┐ packet with tracked id
//!      ▲                          ▲     │ (tickle)
//!      │   last frame / idle      └─────┘
//!      └──────────────────────── (open)
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! Unauthorized or unlinked audio is dropped without any reply. Audio
//! never triggers a NACK; only link requests are answered negatively.
//!
//! ## Last Modified
//! v0.1.0 - Initial stream tracker

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mref_common::StreamId;
use mref_core::{DvFramePacket, DvHeaderPacket, DvPacket};
use tracing::{debug, info};

use crate::services::gatekeeper::Gatekeeper;
use crate::services::registry::ClientRegistry;
use crate::services::router::{Router, Stream};

/// Stream lifecycle tracker, owned by the protocol task.
pub struct StreamTracker {
    registry: Arc<ClientRegistry>,
    gatekeeper: Arc<dyn Gatekeeper>,
    router: Arc<dyn Router>,
    timeout: Duration,
    /// Local view of the streams this task opened. Single-task owned,
    /// so a plain map suffices.
    streams: HashMap<StreamId, Arc<Stream>>,
}

impl StreamTracker {
    /// Creates a tracker over the shared collaborators.
    #[must_use]
    pub fn new(
        registry: Arc<ClientRegistry>,
        gatekeeper: Arc<dyn Gatekeeper>,
        router: Arc<dyn Router>,
        timeout: Duration,
    ) -> Self {
        Self {
            registry,
            gatekeeper,
            router,
            timeout,
            streams: HashMap::new(),
        }
    }

    /// Handles one decoded voice packet.
    ///
    /// Opens the stream if this is the first packet of an authorized
    /// transmission, then pushes the frame toward relay twice (the
    /// second copy flagged, so the distributor emits one datagram per
    /// inbound one). The stream closes immediately on a last frame.
    pub fn handle_audio(
        &mut self,
        header: &DvHeaderPacket,
        frame: &DvFramePacket,
        from: SocketAddr,
    ) {
        let id = header.stream_id();

        if let Some(stream) = self.streams.get(&id) {
            stream.touch();
        } else if !self.try_open(header, from) {
            return;
        }

        self.router.route(DvPacket::Frame(frame.clone()));
        self.router.route(DvPacket::Frame(frame.as_second()));

        if frame.is_last() {
            self.close(id, "last frame");
        }
    }

    /// Attempts to open a stream for the sender. Returns whether the
    /// stream is now tracked. Every refusal is silent on the wire.
    fn try_open(&mut self, header: &DvHeaderPacket, from: SocketAddr) -> bool {
        let Some(client) = self.registry.find_by_addr(from) else {
            debug!(%from, "audio from unlinked address ignored");
            return false;
        };
        if !self
            .gatekeeper
            .may_transmit(header.source(), from, header.module())
        {
            debug!(source = %header.source(), %from, "transmission refused by gatekeeper");
            return false;
        }
        let Some(stream) = self.router.open_stream(header, client.id()) else {
            return false;
        };

        info!(
            stream = %stream.id(),
            source = %header.source(),
            module = %header.module(),
            client = %client.id(),
            "stream opened"
        );
        self.router.route(DvPacket::Header(header.clone()));
        self.streams.insert(stream.id(), stream);
        true
    }

    /// Closes every stream idle past the timeout. Runs once per tick.
    pub fn sweep(&mut self) {
        let idle: Vec<StreamId> = self
            .streams
            .values()
            .filter(|s| s.is_idle_for(self.timeout))
            .map(|s| s.id())
            .collect();
        for id in idle {
            self.close(id, "timeout");
        }
    }

    fn close(&mut self, id: StreamId, reason: &str) {
        if self.streams.remove(&id).is_some() {
            self.router.close_stream(id);
            info!(stream = %id, reason, "stream closed");
        }
    }

    /// Number of live streams this task tracks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Whether no streams are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

// ============================================
// Tests
// ============================================
