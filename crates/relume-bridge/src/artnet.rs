//! Art-Net protocol sender (Art-Net 4)
//!
//! Art-Net is a UDP-based protocol for transmitting DMX512 over Ethernet.
//! The bridge emits plain OpDmx frames to a single target node; polling,
//! discovery and multi-universe routing are out of scope.

use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use relume_core::{ArtNetConfig, Universe, UNIVERSE_SIZE};
use tracing::trace;

use crate::{BridgeError, Result};

const OPDMX_HEADER_LEN: usize = 18;

/// Art-Net sender for outputting DMX frames
pub struct ArtNetSender {
    socket: UdpSocket,
    target: SocketAddr,
    universe: u16,
    sequence: u8,
    last_send: Instant,
    min_interval: Duration,
}

impl ArtNetSender {
    /// Create a new Art-Net sender from the configured target.
    ///
    /// The target address is resolved and validated here, so a misconfigured
    /// deployment fails at transmitter start, not on the first frame.
    pub fn new(config: &ArtNetConfig) -> Result<Self> {
        if config.universe > 0x7FFF {
            return Err(BridgeError::TransmitterUnavailable(format!(
                "invalid Art-Net universe {} (port address is 15-bit)",
                config.universe
            )));
        }

        let target: SocketAddr = config.socket_addr().parse().map_err(|e| {
            BridgeError::TransmitterUnavailable(format!(
                "invalid Art-Net target {}: {e}",
                config.socket_addr()
            ))
        })?;

        let socket = UdpSocket::bind("0.0.0.0:0")
            .and_then(|s| s.set_broadcast(true).map(|()| s))
            .map_err(|e| {
                BridgeError::TransmitterUnavailable(format!("cannot open UDP socket: {e}"))
            })?;

        let min_interval = if config.refresh_hz > 0 {
            Duration::from_millis(1000 / config.refresh_hz as u64)
        } else {
            Duration::ZERO
        };

        Ok(Self {
            socket,
            target,
            universe: config.universe,
            sequence: 0,
            last_send: Instant::now(),
            min_interval,
        })
    }

    /// Send one universe as an OpDmx frame.
    ///
    /// The refresh-rate bound waits out the remainder of the interval
    /// instead of dropping: the sync loop only forwards diffs, so a frame
    /// dropped here would never be resent.
    pub fn send(&mut self, frame: &Universe) -> Result<()> {
        let elapsed = self.last_send.elapsed();
        if elapsed < self.min_interval {
            std::thread::sleep(self.min_interval - elapsed);
        }

        let packet = self.build_artnet_packet(frame.as_bytes());
        self.socket.send_to(&packet, self.target).map_err(|e| {
            BridgeError::TransmitterUnavailable(format!("send to {} failed: {e}", self.target))
        })?;
        self.sequence = self.sequence.wrapping_add(1);
        self.last_send = Instant::now();

        trace!(
            "Sent Art-Net DMX packet for universe {} to {}",
            self.universe,
            self.target
        );

        Ok(())
    }

    /// Build an Art-Net DMX packet (OpDmx)
    fn build_artnet_packet(&self, channels: &[u8; UNIVERSE_SIZE]) -> Vec<u8> {
        let mut packet = vec![0u8; OPDMX_HEADER_LEN + UNIVERSE_SIZE];

        // Header: "Art-Net\0"
        packet[0..8].copy_from_slice(b"Art-Net\0");

        // OpCode: OpDmx (0x5000)
        packet[8..10].copy_from_slice(&0x5000u16.to_le_bytes());

        // Protocol version (14)
        packet[10..12].copy_from_slice(&14u16.to_be_bytes());

        // Sequence
        packet[12] = self.sequence;

        // Physical (0)
        packet[13] = 0;

        // Universe (Port-Address)
        packet[14..16].copy_from_slice(&self.universe.to_le_bytes());

        // Length (512 channels, big-endian)
        packet[16..18].copy_from_slice(&(UNIVERSE_SIZE as u16).to_be_bytes());

        // DMX data
        packet[OPDMX_HEADER_LEN..].copy_from_slice(channels);

        packet
    }

    /// Get the configured universe
    pub fn universe(&self) -> u16 {
        self.universe
    }
}
