//! Relume Bridge - DAW-side DMX forwarding service
//!
//! The bridge is the consumer half of a two-unit lighting add-in: a producer
//! UI writes channel values into a shared universe buffer, and this service
//! polls that buffer, detects changes, and forwards changed frames to an
//! Art-Net node at a bounded rate. When the service stops - cleanly or on
//! error - it drives the output to a blackout frame first, so no fixture is
//! ever left stuck at an arbitrary level.
//!
//! ## Modules
//!
//! - [`store`] - the shared universe buffer (shared-memory and file backends)
//! - [`artnet`] - Art-Net OpDmx sender
//! - [`transmitter`] - the transmitter seam the service drives
//! - [`sync`] - per-tick read/diff/forward engine
//! - [`service`] - lifecycle state machine and cleanup sequence
//! - [`error`] - error types
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relume_bridge::Service;
//! use relume_core::ServiceConfig;
//!
//! # fn main() -> relume_bridge::Result<()> {
//! let mut service = Service::new(ServiceConfig::default());
//! service.start()?;
//! service.run();
//! # Ok(())
//! # }
//! ```

/// Art-Net OpDmx sender
pub mod artnet;
/// Error types
pub mod error;
/// Lifecycle state machine
pub mod service;
/// Shared universe buffer backends
pub mod store;
/// Per-tick synchronization engine
pub mod sync;
/// Transmitter seam
pub mod transmitter;

pub use artnet::ArtNetSender;
pub use error::{BridgeError, Result};
pub use service::{Service, ServiceState};
pub use store::SharedStateStore;
pub use sync::{CancelToken, SyncLoop, TickOutcome, TickReport};
pub use transmitter::{ArtNetTransmitter, Transmitter};
