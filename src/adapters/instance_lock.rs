use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::domain::DomainError;

/// Lock file ensuring only one instance of the application runs at a time.
///
/// Ownership is an exclusive advisory lock on the open file, held until the
/// lock is dropped or the process exits. The file itself stays on disk and
/// carries the owner's PID for diagnostics only.
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
    file: File,
}

impl InstanceLock {
    /// Try to become the running instance.
    ///
    /// Fails with [`DomainError::AlreadyRunning`] while any other handle,
    /// in this process or another, holds the lock.
    pub fn try_acquire(path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let path = path.into();

        // No truncation before the lock is ours: the content is the owner's PID.
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => {
                let pid = read_owner(&path);
                warn!(path = ?path, pid = ?pid, "The application is already running");
                return Err(DomainError::AlreadyRunning { pid });
            }
            Err(TryLockError::Error(e)) => return Err(e.into()),
        }

        // Anything left in the file belongs to an owner that has exited.
        file.set_len(0)?;
        write!(file, "{}", std::process::id())?;
        file.sync_all()?;

        info!(path = ?path, pid = std::process::id(), "Instance lock acquired");
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        // The file is not removed: unlinking a locked file lets a waiting
        // opener lock the orphaned inode while a newcomer locks a fresh one.
        if let Err(e) = self.file.set_len(0) {
            warn!(path = ?self.path, error = %e, "Failed to clear instance lock");
        }
    }
}

fn read_owner(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}
