//! Per-tick synchronization engine
//!
//! One tick: read the store, compare byte-wise against the last forwarded
//! snapshot, forward through the transmitter when different. The loop is
//! deliberately dumb - no versioning, no partial diffs - because the store
//! contract is whole-buffer last-write-wins.
//!
//! Timing lives with the caller: the host drives one tick per callback, and
//! [`Service::run`](crate::Service::run) drives ticks from a channel ticker
//! checked against a [`CancelToken`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use relume_core::Universe;
use tracing::warn;

use crate::store::SharedStateStore;
use crate::transmitter::Transmitter;
use crate::Result;

/// Cooperative cancellation flag
///
/// Cloneable across threads; cancellation is observed at the next tick,
/// never preemptively, so a tick in flight always completes its current
/// step.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Fresh, uncancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation (idempotent)
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// True once `cancel` has been called
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// What one tick observed and did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Store content differed from the last forwarded snapshot
    pub changed: bool,
    /// A frame actually went out on the wire
    pub sent: bool,
}

/// Reschedule decision for the host-facing tick entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Keep polling; schedule another tick
    Continue(TickReport),
    /// Terminal - the service left the Running state; do not reschedule
    Stopped,
}

/// Snapshot-diffing forwarding engine
///
/// Owns the consumer-private state: the last forwarded snapshot and the
/// send-enable latch. The snapshot starts zeroed, equal to a freshly created
/// store, so a fresh pairing sends nothing until the first producer write.
#[derive(Debug)]
pub struct SyncLoop {
    snapshot: Universe,
    sending: bool,
}

impl SyncLoop {
    /// New engine with a zeroed snapshot and sending enabled.
    pub fn new() -> Self {
        Self {
            snapshot: Universe::zeroed(),
            sending: true,
        }
    }

    /// Run one tick against the given store and (optional) transmitter.
    ///
    /// A store read failure propagates - the caller treats a broken channel
    /// as fatal. A transmitter failure does not: it latches sending off with
    /// a one-time warning, and the loop keeps polling and tracking so a
    /// later [`enable_sending`](Self::enable_sending) resumes from fresh
    /// state instead of replaying stale diffs.
    pub fn tick(
        &mut self,
        store: &mut dyn SharedStateStore,
        transmitter: Option<&mut (dyn Transmitter + 'static)>,
    ) -> Result<TickReport> {
        let current = store.read()?;

        let changed = current != self.snapshot;
        let mut sent = false;

        if changed {
            if let Some(tx) = transmitter {
                if self.sending {
                    match tx.send(&current) {
                        Ok(()) => sent = true,
                        Err(e) => {
                            // One-time warning; the latch keeps it from repeating
                            self.sending = false;
                            warn!("Transmitter send failed, sending disabled: {e}");
                        }
                    }
                }
            }
            // Advance the snapshot even when nothing was sent, so a
            // re-enabled transmitter never replays diffs it never needed
            self.snapshot = current;
        }

        Ok(TickReport { changed, sent })
    }

    /// Last forwarded (or tracked) buffer state.
    pub fn snapshot(&self) -> &Universe {
        &self.snapshot
    }

    /// Whether frames are currently being forwarded.
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Re-arm sending after a send failure latched it off.
    pub fn enable_sending(&mut self) {
        self.sending = true;
    }
}

impl Default for SyncLoop {
    fn default() -> Self {
        Self::new()
    }
}
