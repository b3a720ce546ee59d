// Single-instance guard backed by an OS-locked pid file
//
// The lock lives on the open file, not in its contents: the kernel drops it
// when the owning process exits, crashes or aborts, so a leftover pid file
// never blocks the next start.
use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use shardmon_core::{AppError, Result};

/// Held for the monitor's lifetime; removes the pid file on drop
pub struct InstanceLock {
    path: PathBuf,
    file: Option<sys::LockedFile>,
}

impl InstanceLock {
    /// Claim the pid file for this process
    ///
    /// A pid file nobody holds (left by a dead monitor) is taken over.
    ///
    /// # Errors
    /// - AppError::InstanceRunning if another process holds the lock; carries
    ///   its pid when the file already records one
    /// - AppError::Io if the file cannot be opened, locked or written
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut file = sys::lock(&path)?;

        if let Some(previous) = read_pid(&mut file) {
            warn!(path = %path.display(), previous_pid = previous, "Replacing stale pid file");
        }
        write_pid(&mut file)?;
        info!(path = %path.display(), pid = std::process::id(), "Instance lock acquired");

        Ok(Self {
            path,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for InstanceLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceLock")
            .field("path", &self.path)
            .finish()
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            sys::release(file, &self.path);
        }
    }
}

fn read_pid(file: &mut File) -> Option<i32> {
    let mut contents = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut contents).ok()?;
    contents.trim().parse::<i32>().ok()
}

fn write_pid(file: &mut File) -> std::io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{}", std::process::id())?;
    file.sync_all()
}

fn remove_pid_file(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove pid file");
        }
    }
}

#[cfg(unix)]
mod sys {
    use super::{read_pid, remove_pid_file};
    use nix::errno::Errno;
    use nix::fcntl::{Flock, FlockArg};
    use shardmon_core::{AppError, Result};
    use std::fs::{self, File, OpenOptions};
    use std::io::ErrorKind;
    use std::os::unix::fs::MetadataExt;
    use std::path::Path;

    pub type LockedFile = Flock<File>;

    /// Owners unlink the file before unlocking, so a lock won on an unlinked
    /// inode is retried against the fresh file
    const LOCK_ATTEMPTS: usize = 3;

    pub fn lock(path: &Path) -> Result<LockedFile> {
        for _ in 0..LOCK_ATTEMPTS {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(path)?;

            let locked = match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
                Ok(locked) => locked,
                Err((mut file, errno)) if errno == Errno::EWOULDBLOCK => {
                    return Err(AppError::InstanceRunning(read_pid(&mut file)));
                }
                Err((_, errno)) => return Err(std::io::Error::from(errno).into()),
            };

            if still_linked(&locked, path)? {
                return Ok(locked);
            }
        }
        Err(AppError::InstanceRunning(None))
    }

    pub fn release(file: LockedFile, path: &Path) {
        remove_pid_file(path);
        drop(file);
    }

    fn still_linked(file: &File, path: &Path) -> Result<bool> {
        let held = file.metadata()?;
        match fs::metadata(path) {
            Ok(current) => Ok(current.dev() == held.dev() && current.ino() == held.ino()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(windows)]
mod sys {
    use super::remove_pid_file;
    use shardmon_core::{AppError, Result};
    use std::fs::{File, OpenOptions};
    use std::os::windows::fs::OpenOptionsExt;
    use std::path::Path;

    pub type LockedFile = File;

    const ERROR_SHARING_VIOLATION: i32 = 32;

    /// Opens the file with no sharing; a second open fails while we hold it
    pub fn lock(path: &Path) -> Result<LockedFile> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .share_mode(0)
            .open(path)
            .map_err(|e| match e.raw_os_error() {
                Some(ERROR_SHARING_VIOLATION) => AppError::InstanceRunning(None),
                _ => AppError::Io(e),
            })
    }

    pub fn release(file: LockedFile, path: &Path) {
        // An unshared handle blocks deletion, close it first
        drop(file);
        remove_pid_file(path);
    }
}
