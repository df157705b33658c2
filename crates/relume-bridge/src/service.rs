//! Service lifecycle
//!
//! [`Service`] owns everything with process-wide lifetime: the store handle,
//! the transmitter, the sync engine, the cancellation token and the cleanup
//! guard. There are no ambient globals; the host (or a binary) holds the
//! `Service` value and drives it.
//!
//! The one hard guarantee of the whole bridge lives here: whichever path
//! takes the service down - clean shutdown, cancellation, a broken store -
//! the cleanup sequence drives the output to a blackout frame before the
//! transmitter is torn down, and always terminates in
//! [`ServiceState::Stopped`].

use std::thread;
use std::time::Duration;

use relume_core::{ServiceConfig, Universe};
use tracing::{error, info, warn};

use crate::store::{self, SharedStateStore};
use crate::sync::{CancelToken, SyncLoop, TickOutcome};
use crate::transmitter::{ArtNetTransmitter, Transmitter};
use crate::Result;

// Lets the final packet leave the protocol layer before the transport goes
// away; without this pause the blackout can be lost in teardown.
const BLACKOUT_FLUSH_DELAY: Duration = Duration::from_millis(50);

/// Lifecycle states of the bridge service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Built, not started
    Uninitialized,
    /// Startup sequence in progress
    Initializing,
    /// Polling (sending may be disabled if the transmitter is down)
    Running,
    /// Cleanup sequence in progress
    Cleaning,
    /// Terminal
    Stopped,
}

/// The bridge service: store, transmitter, sync engine and lifecycle
pub struct Service {
    config: ServiceConfig,
    state: ServiceState,
    store: Option<Box<dyn SharedStateStore>>,
    transmitter: Option<Box<dyn Transmitter>>,
    // start() succeeded on the transmitter; gates sending and the blackout
    transmitter_active: bool,
    sync: SyncLoop,
    cancel: CancelToken,
    // Single cleanup-in-progress guard; cleanup runs exactly once
    cleaning: bool,
}

impl Service {
    /// Build an unstarted service; the transmitter will be an Art-Net
    /// sender for the configured target.
    pub fn new(config: ServiceConfig) -> Self {
        let artnet = ArtNetTransmitter::new(config.artnet.clone());
        Self::with_transmitter(config, Box::new(artnet))
    }

    /// Build an unstarted service around an explicit transmitter.
    ///
    /// This is the seam the tests use to substitute a recording fake.
    pub fn with_transmitter(config: ServiceConfig, transmitter: Box<dyn Transmitter>) -> Self {
        Self {
            config,
            state: ServiceState::Uninitialized,
            store: None,
            transmitter: Some(transmitter),
            transmitter_active: false,
            sync: SyncLoop::new(),
            cancel: CancelToken::new(),
            cleaning: false,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Token that requests a cooperative stop; observed on the next tick.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Last buffer state the sync engine has tracked.
    pub fn snapshot(&self) -> &Universe {
        self.sync.snapshot()
    }

    /// Whether frames are currently going out on the wire.
    pub fn is_sending(&self) -> bool {
        self.transmitter_active && self.sync.is_sending()
    }

    /// Run the startup sequence.
    ///
    /// Store creation is the one fatal step: without the hand-off channel
    /// there is nothing to synchronize, so a failure aborts straight to
    /// `Stopped` and returns the error. A transmitter that will not start
    /// only costs the output path - the service still comes up, keeps
    /// tracking producer state, and logs a warning.
    pub fn start(&mut self) -> Result<()> {
        if self.state != ServiceState::Uninitialized {
            warn!("start() ignored in state {:?}", self.state);
            return Ok(());
        }

        self.state = ServiceState::Initializing;
        info!("Starting bridge service");

        let store = match store::open(&self.config.store) {
            Ok(store) => store,
            Err(e) => {
                error!("Cannot create store, aborting startup: {e}");
                // Nothing was acquired; no cleanup sequence to run
                self.state = ServiceState::Stopped;
                return Err(e);
            }
        };
        info!("Store ready: {}", store.identifier());
        self.store = Some(store);

        if let Some(tx) = self.transmitter.as_deref_mut() {
            match tx.start() {
                Ok(()) => self.transmitter_active = true,
                Err(e) => {
                    warn!("Transmitter failed to start, continuing without output: {e}");
                }
            }
        }

        self.state = ServiceState::Running;
        info!(
            "Bridge service running (poll every {} ms, sending {})",
            self.config.poll_interval_ms,
            if self.transmitter_active { "on" } else { "off" }
        );
        Ok(())
    }

    /// Run one sync tick; the host calls this from its per-tick callback
    /// and reschedules only on [`TickOutcome::Continue`].
    ///
    /// A store failure is fatal: it is logged, the cleanup sequence runs,
    /// and the outcome is `Stopped`.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != ServiceState::Running {
            return TickOutcome::Stopped;
        }
        if self.cancel.is_cancelled() {
            self.shutdown();
            return TickOutcome::Stopped;
        }

        let Some(store) = self.store.as_deref_mut() else {
            // Running without a store is unreachable; fail safe
            self.shutdown();
            return TickOutcome::Stopped;
        };
        let transmitter = if self.transmitter_active {
            self.transmitter.as_deref_mut()
        } else {
            None
        };

        match self.sync.tick(store, transmitter) {
            Ok(report) => TickOutcome::Continue(report),
            Err(e) => {
                error!("Store read failed, stopping service: {e}");
                self.shutdown();
                TickOutcome::Stopped
            }
        }
    }

    /// Drive the loop from an internal ticker until cancelled or stopped.
    ///
    /// This is the standalone (daemon) variant of the host-driven `tick`;
    /// it always ends having run the cleanup sequence.
    pub fn run(&mut self) {
        let ticker = crossbeam_channel::tick(Duration::from_millis(self.config.poll_interval_ms));

        loop {
            if ticker.recv().is_err() {
                break;
            }
            if matches!(self.tick(), TickOutcome::Stopped) {
                break;
            }
        }

        // No-op when tick() already cleaned up
        self.shutdown();
    }

    /// Run the ordered cleanup sequence and transition to `Stopped`.
    ///
    /// Idempotent: repeated or re-entrant requests are no-ops. Every step is
    /// best-effort - a failing step is logged and the sequence continues, so
    /// the service always reaches `Stopped` and never propagates an error
    /// out of teardown.
    pub fn shutdown(&mut self) {
        if self.cleaning || self.state == ServiceState::Stopped {
            return;
        }
        if self.state == ServiceState::Uninitialized {
            // Nothing acquired yet
            self.state = ServiceState::Stopped;
            return;
        }

        self.cleaning = true;
        self.state = ServiceState::Cleaning;
        info!("Cleanup started");

        // 1. Stop the loop from rescheduling
        self.cancel.cancel();

        // 2. Blackout, flush, stop - only if the transmitter ever came up
        if self.transmitter_active {
            if let Some(tx) = self.transmitter.as_deref_mut() {
                match tx.send(&Universe::zeroed()) {
                    Ok(()) => {
                        info!("Blackout frame sent");
                        thread::sleep(BLACKOUT_FLUSH_DELAY);
                    }
                    Err(e) => warn!("Blackout frame failed: {e}"),
                }
                if let Err(e) = tx.stop() {
                    warn!("Transmitter stop failed: {e}");
                }
            }
            self.transmitter_active = false;
        }

        // 3. Release the hand-off channel
        if let Some(mut store) = self.store.take() {
            if let Err(e) = store.destroy() {
                warn!("Store destroy failed: {e}");
            }
        }

        // 4. Terminal
        self.state = ServiceState::Stopped;
        info!("Cleanup finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relume_core::StoreConfig;

    fn config_in(dir: &tempfile::TempDir) -> ServiceConfig {
        let mut config = ServiceConfig {
            store: StoreConfig::File {
                path: dir.path().join("u.dmx"),
            },
            ..ServiceConfig::default()
        };
        // Keep test traffic off the broadcast address
        config.artnet.target = "127.0.0.1".to_string();
        config
    }

    #[test]
    fn test_new_service_is_uninitialized() {
        let dir = tempfile::tempdir().unwrap();
        let service = Service::new(config_in(&dir));
        assert_eq!(service.state(), ServiceState::Uninitialized);
    }

    #[test]
    fn test_tick_before_start_is_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = Service::new(config_in(&dir));
        assert_eq!(service.tick(), TickOutcome::Stopped);
    }

    #[test]
    fn test_shutdown_before_start_just_stops() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = Service::new(config_in(&dir));
        service.shutdown();
        assert_eq!(service.state(), ServiceState::Stopped);
    }

    #[test]
    fn test_start_twice_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = Service::new(config_in(&dir));
        service.start().unwrap();
        service.start().unwrap();
        assert_eq!(service.state(), ServiceState::Running);
        service.shutdown();
    }
}
