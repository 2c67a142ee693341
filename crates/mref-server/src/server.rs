// ============================================
// File: crates/mref-server/src/server.rs
// ============================================
//! # Reflector Orchestrator
//!
//! ## Creation Reason
//! Wires the pieces together and owns their lifetimes: builds the
//! shared services from the configuration, binds the socket, spawns
//! the protocol task, and tears everything down on Ctrl-C.
//!
//! ## Wiring
//! ```text
//!                 Config
//!                   │
//!   ┌───────────────┼──────────────────┐
//!   ▼               ▼                  ▼
//! UdpTransport   ClientRegistry   ListGatekeeper
//!   │               │                  │
//!   └───────► ReflectorRouter ◄────────┘
//!                   │
//!                M17Task (spawned)
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial orchestrator

use std::sync::Arc;
use std::time::Duration;

use mref_core::M17Codec;
use mref_transport::{Transport, UdpTransport};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::ServerError;
use crate::handlers::{ConnectionNegotiator, KeepaliveSupervisor, RelayDistributor};
use crate::services::{
    ClientRegistry, Gatekeeper, ListGatekeeper, ReflectorRouter, RelayQueue, StreamTracker,
};
use crate::task::M17Task;

/// How long shutdown waits for the protocol task to drain.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// The reflector daemon.
pub struct Reflector {
    config: Config,
}

impl Reflector {
    /// Creates a reflector from a validated configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs until Ctrl-C.
    ///
    /// # Errors
    /// Returns an error if the configuration is inconsistent, the
    /// socket cannot be bound, or signal handling fails. Everything
    /// after startup is contained inside the protocol task.
    pub async fn run(self) -> Result<(), ServerError> {
        let callsign = self.config.callsign()?;
        let modules = self.config.modules();
        let codec = M17Codec::new(callsign);

        let transport: Arc<dyn Transport> =
            Arc::new(UdpTransport::bind(self.config.network.listen_addr)?);
        let registry = Arc::new(ClientRegistry::new());
        let gatekeeper: Arc<dyn Gatekeeper> = Arc::new(ListGatekeeper::new(
            self.config.gatekeeper.blocked_prefixes.clone(),
        ));
        let queue = Arc::new(RelayQueue::new());
        let router = Arc::new(ReflectorRouter::new(
            Arc::clone(&registry),
            Arc::clone(&queue),
        ));

        let negotiator = ConnectionNegotiator::new(
            Arc::clone(&registry),
            Arc::clone(&gatekeeper),
            modules.clone(),
        );
        let streams = StreamTracker::new(
            Arc::clone(&registry),
            Arc::clone(&gatekeeper),
            router,
            self.config.stream_timeout(),
        );
        let relay = RelayDistributor::new(codec.clone(), Arc::clone(&registry), queue);
        let keepalive = KeepaliveSupervisor::new(
            &codec,
            Arc::clone(&registry),
            self.config.keepalive_period(),
            self.config.keepalive_timeout(),
        );

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = M17Task::new(
            Arc::clone(&transport),
            codec,
            negotiator,
            streams,
            relay,
            keepalive,
            self.config.tick(),
            shutdown_rx,
        );
        let handle = tokio::spawn(task.run());

        let module_letters: String = modules.iter().map(mref_common::Module::as_char).collect();
        info!(
            callsign = %self.config.reflector.callsign,
            listen = %self.config.network.listen_addr,
            modules = %module_letters,
            "reflector started"
        );

        tokio::signal::ctrl_c().await?;
        info!("shutdown requested");

        // the task may already be gone if the channel closed early
        let _ = shutdown_tx.send(());
        if tokio::time::timeout(SHUTDOWN_GRACE, handle).await.is_err() {
            warn!("protocol task did not stop within grace period");
        }

        info!("reflector stopped");
        Ok(())
    }
}
