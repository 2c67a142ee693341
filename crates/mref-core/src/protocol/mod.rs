// ============================================
// File: crates/mref-core/src/protocol/mod.rs
// ============================================
//! # Protocol Module
//!
//! Wire-level definitions (tags, sizes, offsets) and the codec that
//! moves between datagrams and typed packets.

pub mod codec;
pub mod messages;

pub use codec::{M17Codec, PacketKind};
