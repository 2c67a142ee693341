// ============================================
// File: crates/mref-server/src/handlers/mod.rs
// ============================================
//! # Packet Handlers
//!
//! The three stages the protocol task delegates to: connection
//! negotiation (control plane), relay distribution (data plane out),
//! and keepalive supervision (liveness).

pub mod keepalive;
pub mod negotiator;
pub mod relay;

pub use keepalive::KeepaliveSupervisor;
pub use negotiator::ConnectionNegotiator;
pub use relay::RelayDistributor;
