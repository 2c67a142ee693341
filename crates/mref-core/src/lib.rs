// ============================================
// File: crates/mref-core/src/lib.rs
// ============================================
//! # mref-core: Protocol Definitions & Codec
//!
//! ## Creation Reason
//! The pure, IO-free heart of the reflector: wire layouts, the CRC, the
//! in-memory packet model, and the codec between them. No sockets, no
//! clocks, no tasks; everything here is testable with byte arrays.
//!
//! ## Main Functionality
//! - `crc`: the M17 CRC-16 guarding every voice frame
//! - `dv`: the protocol-neutral digital-voice packet model
//! - `protocol`: wire constants and the `M17Codec`
//!
//! ## Data Flow
//! ```text
//! datagram ──► M17Codec::classify_and_decode ──► PacketKind
//!                                                   │
//!            DvPacket ◄── relay queue ◄─────────────┘
//!               │
//!               ▼
//!          M17Codec::encode_frame ──► datagram
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial protocol crate

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod crc;
pub mod dv;
pub mod error;
pub mod protocol;

pub use dv::{CodecKind, DvFramePacket, DvHeaderPacket, DvPacket};
pub use error::CoreError;
pub use protocol::{M17Codec, PacketKind};
