//! Demo producer
//!
//! Plays the UI side of the rig: opens the same store as the bridge daemon
//! and sweeps channel 1 up and down a few times, then parks it at zero. Run
//! `relume-bridge` in another terminal and watch the frames go out.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use relume_bridge::{store, SharedStateStore};
use relume_core::{ServiceConfig, Universe};
use tracing::info;
use tracing_subscriber::EnvFilter;

const SWEEP_CHANNEL: u16 = 1;
const SWEEP_CYCLES: usize = 3;
const STEP: Duration = Duration::from_millis(25);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let path = PathBuf::from(path);
            ServiceConfig::from_json_file(&path)
                .with_context(|| format!("loading config from {}", path.display()))?
        }
        None => ServiceConfig::default(),
    };

    // The producer never destroys the store; the service side owns teardown
    let mut store = store::open(&config.store).context("cannot open store")?;
    info!(
        "Sweeping channel {} on {} ({} cycles)",
        SWEEP_CHANNEL,
        store.identifier(),
        SWEEP_CYCLES
    );

    let mut universe = Universe::zeroed();
    for _ in 0..SWEEP_CYCLES {
        for value in (0u8..=255).step_by(5).chain((0u8..=250).rev().step_by(5)) {
            universe.set(SWEEP_CHANNEL, value)?;
            store.write(&universe)?;
            thread::sleep(STEP);
        }
    }

    universe.set(SWEEP_CHANNEL, 0)?;
    store.write(&universe)?;
    info!("Sweep complete, channel parked at 0");

    Ok(())
}
