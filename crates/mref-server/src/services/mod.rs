// ============================================
// File: crates/mref-server/src/services/mod.rs
// ============================================
//! # Shared Services
//!
//! The state the protocol task operates on: who is linked (registry),
//! who is allowed in (gatekeeper), what is transmitting (router and
//! stream tracker), and the queue between intake and relay.

pub mod gatekeeper;
pub mod registry;
pub mod router;
pub mod streams;

pub use gatekeeper::{Gatekeeper, ListGatekeeper};
pub use registry::{Client, ClientRegistry};
pub use router::{ReflectorRouter, RelayQueue, Router, Stream};
pub use streams::StreamTracker;
