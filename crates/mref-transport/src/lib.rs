// ============================================
// File: crates/mref-transport/src/lib.rs
// ============================================
//! # mref-transport: Datagram Channel
//!
//! ## Creation Reason
//! Isolates socket handling from protocol logic. The server crate sees
//! only the `Transport` trait; the UDP details (socket2 bind options,
//! tokio integration, receive deadlines) live here.
//!
//! ## Last Modified
//! v0.1.0 - Initial transport crate

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod traits;
pub mod udp;

pub use error::TransportError;
pub use traits::Transport;
pub use udp::UdpTransport;
