//! Shared universe buffer
//!
//! The store is the hand-off channel between the producer UI unit and this
//! service: a persisted 512-byte mirror of one [`Universe`], readable and
//! writable from either side at whole-buffer granularity. Two backends
//! satisfy the same contract and are selected by [`StoreConfig`]:
//!
//! - [`ShmStore`] - a memory-mapped file in the OS shared-memory directory
//! - [`FileStore`] - a plain file at an explicit path
//!
//! There is no locking and no versioning across the process boundary.
//! Concurrent access is whole-buffer last-write-wins: a reader that catches
//! a write in flight gets a torn frame, forwards it once, and self-corrects
//! on the next tick. That trade-off is deliberate for a human-paced control
//! surface; do not reuse this store for data that needs atomicity.

mod file;
mod shm;

pub use file::FileStore;
pub use shm::ShmStore;

use relume_core::{StoreConfig, Universe};

use crate::Result;

/// Persisted mirror of one universe, shared between producer and consumer.
///
/// Reads and writes always cover the full 512 bytes; short reads are retried
/// inside the backend and never escape this contract. `destroy` releases the
/// backing resource and is safe to call when the resource is already gone.
pub trait SharedStateStore: Send {
    /// Human-readable identifier for log messages
    fn identifier(&self) -> &str;

    /// Read the full current content of the store
    fn read(&mut self) -> Result<Universe>;

    /// Overwrite the full content of the store
    fn write(&mut self, universe: &Universe) -> Result<()>;

    /// Release the backing resource (delete file / unlink segment)
    fn destroy(&mut self) -> Result<()>;
}

/// Open (creating if needed) the store described by `config`.
pub fn open(config: &StoreConfig) -> Result<Box<dyn SharedStateStore>> {
    match config {
        StoreConfig::SharedMemory { name } => Ok(Box::new(ShmStore::create(name)?)),
        StoreConfig::File { path } => Ok(Box::new(FileStore::create(path)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relume_core::StoreConfig;

    #[test]
    fn test_open_selects_backend_from_config() {
        let dir = tempfile::tempdir().unwrap();

        let mut file_store = open(&StoreConfig::File {
            path: dir.path().join("universe.dmx"),
        })
        .unwrap();
        assert!(file_store.identifier().starts_with("file:"));
        file_store.destroy().unwrap();

        let mut shm_store = open(&StoreConfig::SharedMemory {
            name: "relume-test-open-backend".to_string(),
        })
        .unwrap();
        assert!(shm_store.identifier().starts_with("shm:"));
        shm_store.destroy().unwrap();
    }
}
