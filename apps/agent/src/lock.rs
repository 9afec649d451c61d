//! Per-vault lock file, so two agent processes never sync one vault at once.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::STATE_DIR;

const LOCK_FILE: &str = "sync.lock";

/// A lock older than this is left over from a process that did not exit
/// cleanly and is taken over.
pub const STALE_AFTER: Duration = Duration::from_secs(60 * 60);

/// Held lock. Dropping it removes the lock file.
#[derive(Debug)]
pub struct VaultLock {
    path: PathBuf,
}

impl VaultLock {
    /// Lock file location for a vault.
    pub fn path_for(vault: &Path) -> PathBuf {
        vault.join(STATE_DIR).join(LOCK_FILE)
    }

    /// Take the vault's lock, or `None` if another process holds it.
    pub fn acquire(vault: &Path) -> std::io::Result<Option<Self>> {
        let path = Self::path_for(vault);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        match Self::create(&path) {
            Ok(lock) => Ok(Some(lock)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if !is_stale(&path) {
                    debug!(path = %path.display(), "Vault lock is held");
                    return Ok(None);
                }
                warn!(path = %path.display(), "Replacing stale vault lock");
                fs::remove_file(&path)?;
                match Self::create(&path) {
                    Ok(lock) => Ok(Some(lock)),
                    Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    fn create(path: &Path) -> std::io::Result<Self> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        writeln!(
            file,
            "pid {} since {}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        )?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl Drop for VaultLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(error = %e, path = %self.path.display(), "Failed to remove vault lock");
        }
    }
}

fn is_stale(path: &Path) -> bool {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .map(|age| age > STALE_AFTER)
        .unwrap_or(false)
}
