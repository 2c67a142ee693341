// ============================================
// File: crates/mref-common/src/lib.rs
// ============================================
//! # mref-common: Shared Foundation
//!
//! ## Creation Reason
//! Foundation crate for the mref reflector workspace. Holds the types
//! every other crate agrees on so the protocol, transport, and server
//! crates never depend on each other for basics.
//!
//! ## Main Functionality
//! - Core identifiers: callsigns, modules, stream and client handles
//! - Lock-free activity stamps and cadence timers
//! - Shared error definitions
//!
//! ## Architecture Position
//! ```text
//! ┌──────────────────────────────┐
//! │         mref-server          │
//! ├─────────────┬────────────────┤
//! │  mref-core  │ mref-transport │
//! ├─────────────┴────────────────┤
//! │         mref-common          │  ← this crate
//! └──────────────────────────────┘
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial workspace layout

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod time;
pub mod types;

pub use error::CommonError;
pub use time::{AtomicInstant, PeriodTimer};
pub use types::{Callsign, ClientId, Module, StreamId};
