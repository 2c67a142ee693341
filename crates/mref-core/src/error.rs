// ============================================
// File: crates/mref-core/src/error.rs
// ============================================
//! # Protocol Error Types
//!
//! ## Creation Reason
//! Decoding errors for the M17 wire codec. The classifier collapses all
//! of these into "unrecognized packet", but the decode functions keep
//! the precise reason so tests and debug logs can name it.
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use mref_common::CommonError;
use thiserror::Error;

/// Errors produced while decoding wire data.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The datagram was not the size the packet form requires.
    #[error("wrong packet size: expected {expected} bytes, got {actual}")]
    WrongSize {
        /// Required size.
        expected: usize,
        /// Received size.
        actual: usize,
    },

    /// The magic tag did not match.
    #[error("bad magic tag")]
    BadMagic,

    /// The trailing CRC did not match the frame body.
    #[error("crc mismatch: computed 0x{computed:04x}, stored 0x{stored:04x}")]
    CrcMismatch {
        /// CRC computed over the body.
        computed: u16,
        /// CRC carried by the frame.
        stored: u16,
    },

    /// The frame-type field does not describe an unencrypted voice
    /// payload.
    #[error("unsupported frame type 0x{frame_type:04x}")]
    UnsupportedFrameType {
        /// The raw frame-type value.
        frame_type: u16,
    },

    /// The destination callsign carries no module letter.
    #[error("destination has no module letter")]
    MissingModule,

    /// A callsign field failed to decode.
    #[error(transparent)]
    Callsign(#[from] CommonError),
}

impl CoreError {
    /// Creates a `WrongSize` error.
    #[must_use]
    pub const fn wrong_size(expected: usize, actual: usize) -> Self {
        Self::WrongSize { expected, actual }
    }

    /// Creates a `CrcMismatch` error.
    #[must_use]
    pub const fn crc_mismatch(computed: u16, stored: u16) -> Self {
        Self::CrcMismatch { computed, stored }
    }

    /// CRC failures usually mean line corruption rather than a hostile
    /// or confused peer; callers may count them separately.
    #[must_use]
    pub const fn is_corruption(&self) -> bool {
        matches!(self, Self::CrcMismatch { .. })
    }
}
