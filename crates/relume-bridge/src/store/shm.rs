//! Shared-memory store backend
//!
//! Maps a 512-byte file in the OS shared-memory directory (`/dev/shm` on
//! Linux, the temp dir elsewhere), so producer and consumer processes see
//! the same page without any copying through the filesystem proper.

use std::fs::OpenOptions;
use std::path::PathBuf;

use memmap2::MmapMut;
use relume_core::{Universe, UNIVERSE_SIZE};
use tracing::{debug, info};

use crate::{BridgeError, Result, SharedStateStore};

/// Memory-mapped shared universe buffer
pub struct ShmStore {
    ident: String,
    path: PathBuf,
    // None once destroyed; read/write then report ChannelClosed
    map: Option<MmapMut>,
}

impl ShmStore {
    /// Create or open the named segment, sized to exactly one universe.
    ///
    /// A newly created segment is zero-filled. An existing segment of any
    /// other size belongs to someone else and is refused.
    pub fn create(name: &str) -> Result<Self> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(BridgeError::ResourceUnavailable(format!(
                "invalid segment name {name:?}: must be a bare file name"
            )));
        }

        let path = shm_dir().join(name);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|e| {
                BridgeError::ResourceUnavailable(format!("cannot open segment {name}: {e}"))
            })?;

        let len = file
            .metadata()
            .map_err(|e| {
                BridgeError::ResourceUnavailable(format!("cannot stat segment {name}: {e}"))
            })?
            .len();

        if len == 0 {
            // Fresh segment: size it; the kernel zero-fills the extension
            file.set_len(UNIVERSE_SIZE as u64).map_err(|e| {
                BridgeError::ResourceUnavailable(format!("cannot size segment {name}: {e}"))
            })?;
            debug!("Created shared segment {:?} ({} bytes)", path, UNIVERSE_SIZE);
        } else if len != UNIVERSE_SIZE as u64 {
            return Err(BridgeError::ResourceUnavailable(format!(
                "segment {name} exists with incompatible size {len} (expected {UNIVERSE_SIZE})"
            )));
        }

        // Safety: the mapping is over a regular file we just opened and
        // sized; both sides of the pairing only ever access it through this
        // whole-buffer contract.
        let map = unsafe { MmapMut::map_mut(&file) }.map_err(|e| {
            BridgeError::ResourceUnavailable(format!("cannot map segment {name}: {e}"))
        })?;

        info!("Shared segment ready: {:?}", path);

        Ok(Self {
            ident: format!("shm:{name}"),
            path,
            map: Some(map),
        })
    }
}

#[cfg(target_os = "linux")]
fn shm_dir() -> PathBuf {
    PathBuf::from("/dev/shm")
}

#[cfg(not(target_os = "linux"))]
fn shm_dir() -> PathBuf {
    std::env::temp_dir()
}

impl SharedStateStore for ShmStore {
    fn identifier(&self) -> &str {
        &self.ident
    }

    fn read(&mut self) -> Result<Universe> {
        let map = self
            .map
            .as_ref()
            .ok_or_else(|| BridgeError::ChannelClosed(self.ident.clone()))?;

        let mut bytes = [0u8; UNIVERSE_SIZE];
        bytes.copy_from_slice(&map[..UNIVERSE_SIZE]);
        Ok(Universe::from_bytes(bytes))
    }

    fn write(&mut self, universe: &Universe) -> Result<()> {
        let map = self
            .map
            .as_mut()
            .ok_or_else(|| BridgeError::ChannelClosed(self.ident.clone()))?;

        map[..UNIVERSE_SIZE].copy_from_slice(universe.as_bytes());
        Ok(())
    }

    fn destroy(&mut self) -> Result<()> {
        // Drop the mapping before unlinking
        self.map = None;

        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Unlinked shared segment {:?}", self.path);
                Ok(())
            }
            // Already gone counts as done
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for ShmStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShmStore")
            .field("ident", &self.ident)
            .field("mapped", &self.map.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_name(tag: &str) -> String {
        format!("relume-test-{}-{}", tag, std::process::id())
    }

    fn segment_path(name: &str) -> PathBuf {
        shm_dir().join(name)
    }

    #[test]
    fn test_create_zero_fills() {
        let name = unique_name("zero");
        let mut store = ShmStore::create(&name).unwrap();

        assert!(store.read().unwrap().is_dark());
        store.destroy().unwrap();
    }

    #[test]
    fn test_two_handles_share_content() {
        // Same-process stand-in for the producer/consumer pairing
        let name = unique_name("pair");
        let mut producer = ShmStore::create(&name).unwrap();
        let mut consumer = ShmStore::create(&name).unwrap();

        let mut frame = Universe::zeroed();
        frame.set(1, 255).unwrap();
        producer.write(&frame).unwrap();

        assert_eq!(consumer.read().unwrap(), frame);

        consumer.destroy().unwrap();
        // Producer's destroy finds the file already unlinked: still success
        producer.destroy().unwrap();
    }

    #[test]
    fn test_incompatible_size_is_refused() {
        let name = unique_name("size");
        let path = segment_path(&name);
        std::fs::write(&path, b"wrong size").unwrap();

        let result = ShmStore::create(&name);
        assert!(matches!(result, Err(BridgeError::ResourceUnavailable(_))));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_path_like_names_are_refused() {
        assert!(ShmStore::create("").is_err());
        assert!(ShmStore::create("../escape").is_err());
        assert!(ShmStore::create("a/b").is_err());
    }

    #[test]
    fn test_read_after_destroy_reports_closed() {
        let name = unique_name("closed");
        let mut store = ShmStore::create(&name).unwrap();
        store.destroy().unwrap();

        assert!(matches!(store.read(), Err(BridgeError::ChannelClosed(_))));
        assert!(matches!(
            store.write(&Universe::zeroed()),
            Err(BridgeError::ChannelClosed(_))
        ));
    }

    #[test]
    fn test_destroy_twice_is_a_no_op() {
        let name = unique_name("twice");
        let mut store = ShmStore::create(&name).unwrap();
        store.destroy().unwrap();
        store.destroy().unwrap();
    }
}
