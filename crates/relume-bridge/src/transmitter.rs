//! Transmitter seam
//!
//! The service drives the protocol sender as an opaque collaborator with a
//! start/send/stop surface. Production uses [`ArtNetTransmitter`]; tests
//! substitute a recording fake. Transmitter failures are never fatal to the
//! service - it degrades to store-only mode and keeps tracking state.

use relume_core::{ArtNetConfig, Universe};
use tracing::info;

use crate::artnet::ArtNetSender;
use crate::{BridgeError, Result};

/// Start/send/stop surface of a lighting-protocol sender
pub trait Transmitter: Send {
    /// Bring the sender up; called once during service startup
    fn start(&mut self) -> Result<()>;

    /// Transmit one full universe frame
    fn send(&mut self, frame: &Universe) -> Result<()>;

    /// Tear the sender down; the last frame sent before this must be the
    /// blackout frame when the service is shutting down
    fn stop(&mut self) -> Result<()>;
}

/// Art-Net backed transmitter
pub struct ArtNetTransmitter {
    config: ArtNetConfig,
    // Present between start() and stop()
    sender: Option<ArtNetSender>,
}

impl ArtNetTransmitter {
    /// Build an (unstarted) transmitter for the configured target.
    pub fn new(config: ArtNetConfig) -> Self {
        Self {
            config,
            sender: None,
        }
    }
}

impl Transmitter for ArtNetTransmitter {
    fn start(&mut self) -> Result<()> {
        let sender = ArtNetSender::new(&self.config)?;
        info!(
            "Art-Net transmitter started: {} universe {}",
            self.config.socket_addr(),
            self.config.universe
        );
        self.sender = Some(sender);
        Ok(())
    }

    fn send(&mut self, frame: &Universe) -> Result<()> {
        let sender = self
            .sender
            .as_mut()
            .ok_or_else(|| BridgeError::TransmitterUnavailable("not started".to_string()))?;
        sender.send(frame)
    }

    fn stop(&mut self) -> Result<()> {
        // The UDP socket closes on drop; the explicit call exists so the
        // lifecycle order "blackout, flush, stop" stays visible
        if self.sender.take().is_some() {
            info!("Art-Net transmitter stopped");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_before_start_fails() {
        let mut tx = ArtNetTransmitter::new(ArtNetConfig {
            target: "127.0.0.1".to_string(),
            ..ArtNetConfig::default()
        });
        assert!(matches!(
            tx.send(&Universe::zeroed()),
            Err(BridgeError::TransmitterUnavailable(_))
        ));
    }

    #[test]
    fn test_start_send_stop() {
        let mut tx = ArtNetTransmitter::new(ArtNetConfig {
            target: "127.0.0.1".to_string(),
            refresh_hz: 0,
            ..ArtNetConfig::default()
        });

        tx.start().unwrap();
        tx.send(&Universe::zeroed()).unwrap();
        tx.stop().unwrap();

        // Stopped transmitter refuses further frames
        assert!(tx.send(&Universe::zeroed()).is_err());
    }

    #[test]
    fn test_start_with_bad_target_fails() {
        let mut tx = ArtNetTransmitter::new(ArtNetConfig {
            target: "definitely not an ip".to_string(),
            ..ArtNetConfig::default()
        });
        assert!(tx.start().is_err());
    }

    #[test]
    fn test_stop_without_start_is_a_no_op() {
        let mut tx = ArtNetTransmitter::new(ArtNetConfig::default());
        tx.stop().unwrap();
    }
}
