//! Service configuration
//!
//! All knobs of the bridge service live in one serde-loadable struct. The
//! defaults reproduce a single-universe rig: one shared-memory hand-off
//! buffer, one Art-Net node on the standard port, a 50 Hz poll.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON or has the wrong shape
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-level configuration for one bridge service instance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    /// Where the producer/consumer hand-off buffer lives
    #[serde(default)]
    pub store: StoreConfig,

    /// Art-Net output target
    #[serde(default)]
    pub artnet: ArtNetConfig,

    /// Poll interval of the sync loop in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Storage backend for the shared universe buffer
///
/// Both backends satisfy the same read/write/destroy contract; which one a
/// deployment uses is purely a configuration matter. The identifier must be
/// unique per concurrent service instance on a host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Memory-mapped segment in the OS shared-memory directory
    SharedMemory {
        /// Segment name (a bare file name, no path separators)
        name: String,
    },
    /// Plain file at an explicit path
    File {
        /// Full path of the 512-byte buffer file
        path: PathBuf,
    },
}

/// Art-Net transmitter target
///
/// These values are handed to the sender unchanged; the sync core does not
/// reinterpret them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtNetConfig {
    /// Destination node address (IP or broadcast address)
    pub target: String,

    /// UDP port, protocol standard 6454
    #[serde(default = "default_artnet_port")]
    pub port: u16,

    /// Art-Net universe (0-based port address)
    #[serde(default)]
    pub universe: u16,

    /// Refresh-rate hint for the sender in Hz
    #[serde(default = "default_refresh_hz")]
    pub refresh_hz: u32,
}

impl ServiceConfig {
    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl ArtNetConfig {
    /// `target:port` form expected by the UDP sender.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.target, self.port)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            artnet: ArtNetConfig::default(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::SharedMemory {
            name: "relume-universe".to_string(),
        }
    }
}

impl Default for ArtNetConfig {
    fn default() -> Self {
        Self {
            target: "255.255.255.255".to_string(),
            port: default_artnet_port(),
            universe: 0,
            refresh_hz: default_refresh_hz(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    20
}

fn default_artnet_port() -> u16 {
    6454
}

fn default_refresh_hz() -> u32 {
    44
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.poll_interval_ms, 20);
        assert_eq!(config.artnet.port, 6454);
        assert_eq!(config.artnet.universe, 0);
        assert!(matches!(config.store, StoreConfig::SharedMemory { .. }));
    }

    #[test]
    fn test_socket_addr() {
        let artnet = ArtNetConfig {
            target: "192.168.0.14".to_string(),
            ..ArtNetConfig::default()
        };
        assert_eq!(artnet.socket_addr(), "192.168.0.14:6454");
    }

    #[test]
    fn test_minimal_json() {
        // Everything except the target can fall back to a default
        let config: ServiceConfig = serde_json::from_str(
            r#"{ "artnet": { "target": "10.0.0.42" } }"#,
        )
        .unwrap();

        assert_eq!(config.artnet.target, "10.0.0.42");
        assert_eq!(config.artnet.port, 6454);
        assert_eq!(config.poll_interval_ms, 20);
    }

    #[test]
    fn test_file_backend_json() {
        let config: ServiceConfig = serde_json::from_str(
            r#"{
                "store": { "backend": "file", "path": "/tmp/relume-test.dmx" },
                "artnet": { "target": "127.0.0.1", "universe": 3 }
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.store,
            StoreConfig::File {
                path: PathBuf::from("/tmp/relume-test.dmx")
            }
        );
        assert_eq!(config.artnet.universe, 3);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = ServiceConfig::default();
        let json = serde_json::to_string(&config).expect("Failed to serialize config");
        let deserialized: ServiceConfig =
            serde_json::from_str(&json).expect("Failed to deserialize config");
        assert_eq!(config, deserialized);
    }
}
