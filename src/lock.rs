//! Run guard: one organizer run at a time per lock file.
//!
//! Holds an exclusive advisory lock (flock on Unix, LockFileEx on Windows via fs2)
//! from scan through transfer finalization. Acquisition is polled until a timeout;
//! on timeout the caller gets `Ok(None)` and is expected to exit quietly, since
//! overlapping scheduled runs are normal.
//!
//! The lock file itself is left on disk: removing it while another process waits on
//! the same inode would let a third process lock a fresh file.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use crate::fs_ops::io_error_with_help_io;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

/// Default lock file name inside the temp directory.
pub const LOCK_FILE_NAME: &str = "vfo.lock";

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default lock location: `<temp dir>/vfo.lock`.
pub fn default_lock_path() -> PathBuf {
    std::env::temp_dir().join(LOCK_FILE_NAME)
}

/// RAII guard; the lock is released when dropped.
#[derive(Debug)]
pub struct RunGuard {
    file: File,
    path: PathBuf,
}

impl RunGuard {
    /// Try to take the lock, polling until `timeout` elapses.
    ///
    /// `Ok(None)` means another run holds it.
    pub fn acquire(path: &Path, timeout: Duration) -> io::Result<Option<RunGuard>> {
        let file = open_lock_file(path)?;
        let start = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    debug!(path = %path.display(), waited_ms = start.elapsed().as_millis() as u64, "run lock acquired");
                    return Ok(Some(RunGuard {
                        file,
                        path: path.to_path_buf(),
                    }));
                }
                Err(e) if is_contended(&e) => {
                    if start.elapsed() >= timeout {
                        warn!(
                            path = %path.display(),
                            timeout_s = timeout.as_secs_f64(),
                            "another run holds the lock; giving up"
                        );
                        return Ok(None);
                    }
                    trace!(path = %path.display(), "run lock busy; waiting");
                    sleep(POLL_INTERVAL);
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        // Closing the handle releases the lock too; unlocking first keeps it prompt.
        let _ = FileExt::unlock(&self.file);
        trace!(path = %self.path.display(), "run lock released");
    }
}

fn open_lock_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error_with_help_io("create lock directory", parent))?;
    }
    let mut opts = OpenOptions::new();
    opts.read(true).write(true).create(true).truncate(false);
    #[cfg(unix)]
    opts.mode(0o600);
    opts.open(path).map_err(io_error_with_help_io("open lock file", path))
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn second_acquire_times_out_then_succeeds_after_release() {
        let td = tempdir().unwrap();
        let path = td.path().join("vfo.lock");
        let first = RunGuard::acquire(&path, Duration::from_millis(0)).unwrap();
        assert!(first.is_some());

        let start = Instant::now();
        let second = RunGuard::acquire(&path, Duration::from_millis(250)).unwrap();
        assert!(second.is_none());
        assert!(start.elapsed() >= Duration::from_millis(250));

        drop(first);
        let third = RunGuard::acquire(&path, Duration::from_millis(0)).unwrap();
        assert!(third.is_some());
        assert!(path.exists(), "lock file stays on disk");
    }

    #[test]
    fn creates_missing_parent() {
        let td = tempdir().unwrap();
        let path = td.path().join("nested").join("vfo.lock");
        let guard = RunGuard::acquire(&path, Duration::from_secs(1)).unwrap().unwrap();
        assert_eq!(guard.path(), path.as_path());
    }
}
