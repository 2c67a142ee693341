// ============================================
// File: crates/mref-server/src/lib.rs
// ============================================
//! # mref-server: The Reflector Daemon
//!
//! ## Creation Reason
//! Everything that makes the protocol pieces into a running service:
//! configuration, the shared services (registry, gatekeeper, router),
//! the packet handlers, the per-tick protocol task, and the
//! orchestrator that wires them up.
//!
//! ## Module Map
//! ```text
//! config    TOML sections + validation
//! services  registry / gatekeeper / router / stream tracker
//! handlers  negotiator / relay distributor / keepalive supervisor
//! task      the M17 protocol loop
//! server    wiring + lifecycle
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial daemon crate

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod server;
pub mod services;
pub mod task;

pub use config::Config;
pub use error::ServerError;
pub use server::Reflector;
pub use task::M17Task;
