// ============================================
// File: crates/mref-core/src/dv.rs
// ============================================
//! # Digital-Voice Packet Model
//!
//! ## Creation Reason
//! The protocol-neutral in-memory form of a transmission. Everything
//! past the codec works on these types, never on raw datagrams, so the
//! routing and relay stages stay independent of the wire layout.
//!
//! ## Main Functionality
//! - `DvHeaderPacket`: opens a stream (who, to where, which codec)
//! - `DvFramePacket`: one 16-byte voice payload within a stream
//! - `DvPacket`: the closed set of packet kinds the relay queue carries
//!
//! ## ⚠️ Important Note for Next Developer
//! Frame packets are immutable once built. The duplicate-push stage
//! creates the second copy with `as_second()` rather than mutating the
//! original.
//!
//! ## Last Modified
//! v0.1.0 - Initial packet model

use mref_common::{Callsign, Module, StreamId};

/// Size of a voice payload within one frame.
pub const PAYLOAD_SIZE: usize = 16;

/// Size of the per-stream nonce carried in the link setup data.
pub const NONCE_SIZE: usize = 14;

// ============================================
// CodecKind
// ============================================

/// The vocoder mode a stream was encoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecKind {
    /// Codec2 at 3200 bit/s (full rate, 20 ms per payload half).
    Codec2_3200,
    /// Codec2 at 1600 bit/s (half rate).
    Codec2_1600,
}

// ============================================
// DvHeaderPacket
// ============================================

/// The opening packet of a transmission.
#[derive(Debug, Clone)]
pub struct DvHeaderPacket {
    source: Callsign,
    destination: Callsign,
    module: Module,
    stream_id: StreamId,
    codec: CodecKind,
}

impl DvHeaderPacket {
    /// Creates a header packet.
    #[must_use]
    pub const fn new(
        source: Callsign,
        destination: Callsign,
        module: Module,
        stream_id: StreamId,
        codec: CodecKind,
    ) -> Self {
        Self {
            source,
            destination,
            module,
            stream_id,
            codec,
        }
    }

    /// The transmitting station.
    #[must_use]
    pub const fn source(&self) -> &Callsign {
        &self.source
    }

    /// The addressed reflector designator.
    #[must_use]
    pub const fn destination(&self) -> &Callsign {
        &self.destination
    }

    /// The module the transmission targets.
    #[must_use]
    pub const fn module(&self) -> Module {
        self.module
    }

    /// The stream this header opens.
    #[must_use]
    pub const fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    /// The vocoder mode of the stream.
    #[must_use]
    pub const fn codec(&self) -> CodecKind {
        self.codec
    }
}

// ============================================
// DvFramePacket
// ============================================

/// One voice payload within a stream. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct DvFramePacket {
    stream_id: StreamId,
    nonce: [u8; NONCE_SIZE],
    payload: [u8; PAYLOAD_SIZE],
    is_second: bool,
    is_last: bool,
}

impl DvFramePacket {
    /// Creates a frame packet as received from the wire.
    #[must_use]
    pub const fn new(
        stream_id: StreamId,
        nonce: [u8; NONCE_SIZE],
        payload: [u8; PAYLOAD_SIZE],
        is_last: bool,
    ) -> Self {
        Self {
            stream_id,
            nonce,
            payload,
            is_second: false,
            is_last,
        }
    }

    /// Returns a copy flagged as the second of a duplicate pair.
    #[must_use]
    pub fn as_second(&self) -> Self {
        let mut copy = self.clone();
        copy.is_second = true;
        copy
    }

    /// The stream this frame belongs to.
    #[must_use]
    pub const fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    /// The per-stream nonce.
    #[must_use]
    pub const fn nonce(&self) -> &[u8; NONCE_SIZE] {
        &self.nonce
    }

    /// The 16-byte voice payload.
    #[must_use]
    pub const fn payload(&self) -> &[u8; PAYLOAD_SIZE] {
        &self.payload
    }

    /// Whether this copy is the second of a duplicate pair.
    #[must_use]
    pub const fn is_second(&self) -> bool {
        self.is_second
    }

    /// Whether the transmitter flagged this as the final frame.
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.is_last
    }
}

// ============================================
// DvPacket
// ============================================

/// The closed set of packet kinds carried by the relay queue.
#[derive(Debug, Clone)]
pub enum DvPacket {
    /// A stream-opening header.
    Header(DvHeaderPacket),
    /// A voice frame within a stream.
    Frame(DvFramePacket),
}

impl DvPacket {
    /// The stream the packet belongs to, regardless of kind.
    #[must_use]
    pub const fn stream_id(&self) -> StreamId {
        match self {
            Self::Header(h) => h.stream_id(),
            Self::Frame(f) => f.stream_id(),
        }
    }

    /// Whether this packet closes its stream.
    #[must_use]
    pub const fn is_last(&self) -> bool {
        match self {
            Self::Header(_) => false,
            Self::Frame(f) => f.is_last(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(last: bool) -> DvFramePacket {
        DvFramePacket::new(
            StreamId::from_bytes([0xAB, 0xCD]),
            [0u8; NONCE_SIZE],
            [0x11u8; PAYLOAD_SIZE],
            last,
        )
    }

    #[test]
    fn test_as_second_leaves_original_untouched() {
        let first = frame(false);
        let second = first.as_second();
        assert!(!first.is_second());
        assert!(second.is_second());
        assert_eq!(first.stream_id(), second.stream_id());
        assert_eq!(first.payload(), second.payload());
    }

    #[test]
    fn test_dv_packet_accessors() {
        let pkt = DvPacket::Frame(frame(true));
        assert!(pkt.is_last());
        assert_eq!(pkt.stream_id(), StreamId::from_bytes([0xAB, 0xCD]));

        let header = DvHeaderPacket::new(
            Callsign::new("N7TAE").unwrap(),
            Callsign::new("MREF17").unwrap(),
            Module::from_char('A').unwrap(),
            StreamId::from_bytes([1, 2]),
            CodecKind::Codec2_3200,
        );
        let pkt = DvPacket::Header(header);
        assert!(!pkt.is_last());
        assert_eq!(pkt.stream_id(), StreamId::from_bytes([1, 2]));
    }
}
