//! Error types for the bridge service
use thiserror::Error;

/// Bridge service errors
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Store could not be created or opened (fatal at startup)
    #[error("store unavailable: {0}")]
    ResourceUnavailable(String),

    /// Backing store resource was destroyed while the service was running
    #[error("store closed: {0}")]
    ChannelClosed(String),

    /// Transient store read/write failure
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Transmitter failed to start or a send failed (non-fatal, degrades)
    #[error("transmitter unavailable: {0}")]
    TransmitterUnavailable(String),
}

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;
