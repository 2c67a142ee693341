// ============================================
// File: crates/mref-server/src/services/gatekeeper.rs
// ============================================
//! # Link Authorization
//!
//! ## Creation Reason
//! The negotiator and the stream tracker both need a yes/no on whether
//! a station may link or key up. The trait keeps them testable with
//! fakes; the list implementation is what production runs.
//!
//! ## Last Modified
//! v0.1.0 - Initial gatekeeper

use std::net::SocketAddr;

use mref_common::{Callsign, Module};

/// Authorization decisions for linking and transmitting.
pub trait Gatekeeper: Send + Sync {
    /// May this station link to the reflector at all?
    fn may_link(&self, callsign: &Callsign, addr: SocketAddr) -> bool;

    /// May this station open a stream on `module`?
    fn may_transmit(&self, callsign: &Callsign, addr: SocketAddr, module: Module) -> bool;
}

/// Gatekeeper backed by a list of blocked callsign prefixes.
///
/// An empty list admits everyone.
#[derive(Debug, Default)]
pub struct ListGatekeeper {
    blocked_prefixes: Vec<String>,
}

impl ListGatekeeper {
    /// Creates a gatekeeper from configured prefixes. Prefixes are
    /// uppercased so they compare against `Callsign::base` directly.
    #[must_use]
    pub fn new(blocked_prefixes: Vec<String>) -> Self {
        Self {
            blocked_prefixes: blocked_prefixes
                .into_iter()
                .map(|p| p.to_ascii_uppercase())
                .collect(),
        }
    }

    fn is_blocked(&self, callsign: &Callsign) -> bool {
        let base = callsign.base();
        self.blocked_prefixes
            .iter()
            .any(|prefix| base.starts_with(prefix.as_str()))
    }
}

impl Gatekeeper for ListGatekeeper {
    fn may_link(&self, callsign: &Callsign, _addr: SocketAddr) -> bool {
        !self.is_blocked(callsign)
    }

    fn may_transmit(&self, callsign: &Callsign, _addr: SocketAddr, _module: Module) -> bool {
        !self.is_blocked(callsign)
    }
}
