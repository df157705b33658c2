//! Bridge service daemon
//!
//! Standalone consumer: polls the shared universe buffer and forwards
//! changed frames to the configured Art-Net node. Pass a JSON config path
//! as the first argument, or run with defaults.
//!
//! The daemon exits (after blacking out the rig) when the store resource is
//! destroyed externally - deleting the buffer file is the out-of-band stop
//! signal for a producer that has gone away.

use std::path::PathBuf;

use anyhow::{Context, Result};
use relume_bridge::Service;
use relume_core::ServiceConfig;
use tracing_subscriber::EnvFilter;

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

    let mut service = Service::new(config);
    service.start().context("service startup failed")?;
    service.run();

    Ok(())
}
