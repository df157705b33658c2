//! Relume Core - DMX data model and service configuration
//!
//! This crate holds the pure data side of the Relume bridge:
//! - [`universe`] - the 512-channel DMX universe buffer
//! - [`config`] - service configuration (store backend, Art-Net target)
//!
//! No I/O happens here; the store backends, transmitter and service loop
//! live in `relume-bridge`.

/// Service configuration types
pub mod config;
/// DMX universe buffer
pub mod universe;

pub use config::{ArtNetConfig, ConfigError, ServiceConfig, StoreConfig};
pub use universe::{Universe, UniverseError, UNIVERSE_SIZE};
