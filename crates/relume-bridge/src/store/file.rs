//! Plain-file store backend
//!
//! Keeps the universe buffer in an ordinary 512-byte file. Slower than the
//! shared-memory mapping but trivially inspectable, and the variant of
//! choice when the producer runs in an environment without access to the
//! shared-memory directory.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use relume_core::{Universe, UNIVERSE_SIZE};
use tracing::{debug, info};

use crate::{BridgeError, Result, SharedStateStore};

// A writer never truncates the file, so a short read can only be caught
// mid-creation; a couple of retries covers that window.
const READ_ATTEMPTS: u32 = 3;

/// File-backed shared universe buffer
#[derive(Debug)]
pub struct FileStore {
    ident: String,
    path: PathBuf,
    destroyed: bool,
}

impl FileStore {
    /// Create or open the buffer file at `path`.
    ///
    /// A newly created file is zero-filled to exactly one universe; an
    /// existing file of any other size is refused.
    pub fn create(path: &Path) -> Result<Self> {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                file.write_all(&[0u8; UNIVERSE_SIZE]).map_err(|e| {
                    BridgeError::ResourceUnavailable(format!(
                        "cannot initialize buffer file {}: {e}",
                        path.display()
                    ))
                })?;
                debug!("Created buffer file {:?} ({} bytes)", path, UNIVERSE_SIZE);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                // The producer side may have initialized first; accept its
                // content, but only at the exact expected size
                let len = std::fs::metadata(path)
                    .map_err(|e| {
                        BridgeError::ResourceUnavailable(format!(
                            "cannot stat buffer file {}: {e}",
                            path.display()
                        ))
                    })?
                    .len();
                if len != UNIVERSE_SIZE as u64 {
                    return Err(BridgeError::ResourceUnavailable(format!(
                        "buffer file {} exists with incompatible size {len} (expected {UNIVERSE_SIZE})",
                        path.display()
                    )));
                }
            }
            Err(e) => {
                return Err(BridgeError::ResourceUnavailable(format!(
                    "cannot create buffer file {}: {e}",
                    path.display()
                )));
            }
        }

        info!("Buffer file ready: {:?}", path);

        Ok(Self {
            ident: format!("file:{}", path.display()),
            path: path.to_path_buf(),
            destroyed: false,
        })
    }

    fn closed(&self) -> BridgeError {
        BridgeError::ChannelClosed(self.ident.clone())
    }
}

impl SharedStateStore for FileStore {
    fn identifier(&self) -> &str {
        &self.ident
    }

    fn read(&mut self) -> Result<Universe> {
        if self.destroyed {
            return Err(self.closed());
        }

        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            // Deleted out from under us: the channel is gone
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(self.closed()),
            Err(e) => return Err(e.into()),
        };

        let mut bytes = [0u8; UNIVERSE_SIZE];
        let mut attempt = 1;
        loop {
            file.seek(SeekFrom::Start(0))?;
            match file.read_exact(&mut bytes) {
                Ok(()) => return Ok(Universe::from_bytes(bytes)),
                Err(e) if e.kind() == ErrorKind::UnexpectedEof && attempt < READ_ATTEMPTS => {
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn write(&mut self, universe: &Universe) -> Result<()> {
        if self.destroyed {
            return Err(self.closed());
        }

        // Overwrite in place, never truncate: a concurrent reader may see a
        // torn frame (accepted, self-corrects next tick) but never a short
        // file
        let mut file = match OpenOptions::new().write(true).open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(self.closed()),
            Err(e) => return Err(e.into()),
        };
        file.write_all(universe.as_bytes())?;
        Ok(())
    }

    fn destroy(&mut self) -> Result<()> {
        self.destroyed = true;

        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Deleted buffer file {:?}", self.path);
                Ok(())
            }
            // Already gone counts as done
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
