// ============================================
// File: crates/mref-core/src/protocol/messages.rs
// ============================================
//! # Wire Message Definitions
//!
//! ## Creation Reason
//! Single source of truth for every tag, size, offset, and mask on the
//! M17 reflector wire. The codec and its tests both read from here, so
//! a layout change is one edit.
//!
//! ## Wire Summary
//! ```text
//! Connect      11 bytes  "CONN" + callsign(6) + module letter
//! Disconnect   10 bytes  "DISC" + callsign(6)
//! Ping         10 bytes  "PING" + callsign(6)
//! Pong         10 bytes  "PONG" + callsign(6)
//! Acks          4 bytes  "ACKN" / "NACK" / "DISC"
//! Voice frame  54 bytes  see field offsets below
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial wire definitions

// ============================================
// Tags
// ============================================

/// Magic tag opening every voice frame.
pub const MAGIC: &[u8; 4] = b"M17 ";

/// Link request tag.
pub const TAG_CONNECT: &[u8; 4] = b"CONN";

/// Unlink request tag; also the 4-byte unlink acknowledgement.
pub const TAG_DISCONNECT: &[u8; 4] = b"DISC";

/// Keepalive request tag (reflector to client).
pub const TAG_PING: &[u8; 4] = b"PING";

/// Keepalive reply tag (client to reflector).
pub const TAG_PONG: &[u8; 4] = b"PONG";

/// Positive link acknowledgement.
pub const ACK_CONNECT: &[u8; 4] = b"ACKN";

/// Negative link acknowledgement.
pub const NACK_CONNECT: &[u8; 4] = b"NACK";

// ============================================
// Packet Sizes
// ============================================

/// Connect request: tag + callsign + module letter.
pub const CONNECT_SIZE: usize = 11;

/// Disconnect request: tag + callsign.
pub const DISCONNECT_SIZE: usize = 10;

/// Keepalive (either direction): tag + callsign.
pub const KEEPALIVE_SIZE: usize = 10;

/// Voice frame, CRC included.
pub const FRAME_SIZE: usize = 54;

// ============================================
// Voice Frame Offsets
// ============================================

/// Destination callsign (6 bytes).
pub const OFFSET_DESTINATION: usize = 4;

/// Source callsign (6 bytes).
pub const OFFSET_SOURCE: usize = 10;

/// Frame type, u16 big-endian.
pub const OFFSET_FRAME_TYPE: usize = 16;

/// Link setup nonce (14 bytes).
pub const OFFSET_NONCE: usize = 18;

/// Frame number, u16 big-endian.
pub const OFFSET_FRAME_NUMBER: usize = 32;

/// Stream id (2 opaque bytes).
pub const OFFSET_STREAM_ID: usize = 34;

/// Voice payload (16 bytes).
pub const OFFSET_PAYLOAD: usize = 36;

/// Trailing CRC, u16 big-endian over everything before it.
pub const OFFSET_CRC: usize = 52;

// ============================================
// Frame Type & Frame Number Semantics
// ============================================

/// Mask applied to the frame-type low byte to isolate the payload kind.
pub const FRAME_TYPE_KIND_MASK: u8 = 0x1C;

/// Payload-kind value for unencrypted voice. Anything else is rejected.
pub const FRAME_TYPE_KIND_VOICE: u8 = 0x04;

/// Bits of the frame type that select the vocoder mode. Both bits set
/// means Codec2 1600, otherwise Codec2 3200.
pub const FRAME_TYPE_CODEC_MASK: u16 = 0x0006;

/// Frame type emitted for Codec2 3200 streams.
pub const FRAME_TYPE_C2_3200: u16 = 0x0005;

/// Frame type emitted for Codec2 1600 streams.
pub const FRAME_TYPE_C2_1600: u16 = 0x0007;

/// Frame-number bit marking the final frame of a stream.
pub const LAST_FRAME_FLAG: u16 = 0x8000;

/// Frame-number bits carrying the sequence counter.
pub const SEQUENCE_MASK: u16 = 0x7FFF;
