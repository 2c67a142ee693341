// ============================================
// File: crates/mref-server/src/services/registry.rs
// ============================================
//! # Client Registry
//!
//! ## Creation Reason
//! Single owner of every linked client. Everything else in the daemon
//! holds `ClientId` handles or short-lived `Arc<Client>` references;
//! clients are created and removed only here.
//!
//! ## Main Functionality
//! - concurrent arena: `DashMap<ClientId, Arc<Client>>` with a
//!   monotonic id counter
//! - lookups by id, by address, and by linked module
//! - liveness stamping for keepalive replies
//!
//! ## ⚠️ Important Note for Next Developer
//! Traversals filter on the fly; never store an iterator position
//! across calls. The map can change between any two ticks.
//!
//! ## Last Modified
//! v0.1.0 - Initial registry

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use mref_common::{AtomicInstant, Callsign, ClientId, Module, StreamId};
use parking_lot::Mutex;

// ============================================
// Client
// ============================================

/// One linked peer.
#[derive(Debug)]
pub struct Client {
    id: ClientId,
    callsign: Callsign,
    addr: SocketAddr,
    module: Module,
    /// The stream this client is currently transmitting, if any.
    master_of: Mutex<Option<StreamId>>,
    last_heard: AtomicInstant,
}

impl Client {
    fn new(id: ClientId, callsign: Callsign, addr: SocketAddr, module: Module) -> Self {
        Self {
            id,
            callsign,
            addr,
            module,
            master_of: Mutex::new(None),
            last_heard: AtomicInstant::now(),
        }
    }

    /// The registry handle for this client.
    #[must_use]
    pub const fn id(&self) -> ClientId {
        self.id
    }

    /// The callsign the client linked with.
    #[must_use]
    pub const fn callsign(&self) -> &Callsign {
        &self.callsign
    }

    /// Where datagrams for this client go.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The module the client is linked to.
    #[must_use]
    pub const fn module(&self) -> Module {
        self.module
    }

    /// The stream this client currently masters, if any.
    #[must_use]
    pub fn master_of(&self) -> Option<StreamId> {
        *self.master_of.lock()
    }

    /// Marks or clears the master marker.
    pub fn set_master_of(&self, stream: Option<StreamId>) {
        *self.master_of.lock() = stream;
    }

    /// Stamps the client as heard from right now.
    pub fn heard(&self) {
        self.last_heard.touch();
    }

    /// Whether the client has been silent longer than `timeout`.
    #[must_use]
    pub fn is_silent_for(&self, timeout: Duration) -> bool {
        self.last_heard.is_older_than(timeout)
    }
}

// ============================================
// ClientRegistry
// ============================================

/// Concurrent arena of linked clients.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: DashMap<ClientId, Arc<Client>>,
    next_id: AtomicU32,
}

impl ClientRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new client and returns it.
    pub fn add(&self, callsign: Callsign, addr: SocketAddr, module: Module) -> Arc<Client> {
        let id = ClientId::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed));
        let client = Arc::new(Client::new(id, callsign, addr, module));
        self.clients.insert(id, Arc::clone(&client));
        client
    }

    /// Looks a client up by handle.
    #[must_use]
    pub fn get(&self, id: ClientId) -> Option<Arc<Client>> {
        self.clients.get(&id).map(|entry| Arc::clone(&entry))
    }

    /// Removes a client, returning it if it was present.
    pub fn remove(&self, id: ClientId) -> Option<Arc<Client>> {
        self.clients.remove(&id).map(|(_, client)| client)
    }

    /// First client registered from `addr`, if any.
    #[must_use]
    pub fn find_by_addr(&self, addr: SocketAddr) -> Option<Arc<Client>> {
        self.clients
            .iter()
            .find(|entry| entry.addr() == addr)
            .map(|entry| Arc::clone(&entry))
    }

    /// Stamps EVERY client matching (callsign, address) as alive.
    /// More than one may exist when a station relinks quickly.
    pub fn mark_alive(&self, callsign: &Callsign, addr: SocketAddr) {
        for entry in self.clients.iter() {
            if entry.addr() == addr && entry.callsign().base() == callsign.base() {
                entry.heard();
            }
        }
    }

    /// All clients linked to `module`, snapshot at call time.
    #[must_use]
    pub fn linked_to(&self, module: Module) -> Vec<Arc<Client>> {
        self.clients
            .iter()
            .filter(|entry| entry.module() == module)
            .map(|entry| Arc::clone(&entry))
            .collect()
    }

    /// Snapshot of every client, for keepalive rounds.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<Client>> {
        self.clients
            .iter()
            .map(|entry| Arc::clone(&entry))
            .collect()
    }

    /// Number of linked clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether no clients are linked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cs(text: &str) -> Callsign {
        Callsign::new(text).unwrap()
    }

    fn module(c: char) -> Module {
        Module::from_char(c).unwrap()
    }

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn test_add_get_remove() {
        let registry = ClientRegistry::new();
        let client = registry.add(cs("N7TAE"), addr(1000), module('A'));
        assert_eq!(registry.len(), 1);

        let found = registry.get(client.id()).unwrap();
        assert_eq!(found.callsign().base(), "N7TAE");

        let removed = registry.remove(client.id()).unwrap();
        assert_eq!(removed.id(), client.id());
        assert!(registry.is_empty());
        assert!(registry.get(client.id()).is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let registry = ClientRegistry::new();
        let a = registry.add(cs("N7TAE"), addr(1000), module('A'));
        let b = registry.add(cs("LX3JL"), addr(1001), module('A'));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_find_by_addr() {
        let registry = ClientRegistry::new();
        registry.add(cs("N7TAE"), addr(1000), module('A'));
        assert!(registry.find_by_addr(addr(1000)).is_some());
        assert!(registry.find_by_addr(addr(2000)).is_none());
    }

    #[test]
    fn test_mark_alive_touches_every_match() {
        let registry = ClientRegistry::new();
        let a = registry.add(cs("N7TAE"), addr(1000), module('A'));
        let b = registry.add(cs("N7TAE"), addr(1000), module('B'));
        let other = registry.add(cs("LX3JL"), addr(1001), module('A'));

        std::thread::sleep(Duration::from_millis(20));
        registry.mark_alive(&cs("N7TAE"), addr(1000));

        assert!(!a.is_silent_for(Duration::from_millis(10)));
        assert!(!b.is_silent_for(Duration::from_millis(10)));
        assert!(other.is_silent_for(Duration::from_millis(10)));
    }

    #[test]
    fn test_linked_to_filters_by_module() {
        let registry = ClientRegistry::new();
        registry.add(cs("N7TAE"), addr(1000), module('A'));
        registry.add(cs("LX3JL"), addr(1001), module('A'));
        registry.add(cs("F4ABC"), addr(1002), module('B'));

        assert_eq!(registry.linked_to(module('A')).len(), 2);
        assert_eq!(registry.linked_to(module('B')).len(), 1);
        assert_eq!(registry.linked_to(module('C')).len(), 0);
    }

    #[test]
    fn test_master_marker() {
        let registry = ClientRegistry::new();
        let client = registry.add(cs("N7TAE"), addr(1000), module('A'));
        assert_eq!(client.master_of(), None);

        let id = StreamId::from_bytes([1, 2]);
        client.set_master_of(Some(id));
        assert_eq!(client.master_of(), Some(id));

        client.set_master_of(None);
        assert_eq!(client.master_of(), None);
    }
}
