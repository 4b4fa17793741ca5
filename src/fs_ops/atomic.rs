//! Rename into place.
//! - Windows: remove an existing destination first (rename does not replace there).
//! - Unix: rename replaces atomically; the destination directory is fsynced after.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub(super) fn try_atomic_move(src: &Path, dst: &Path) -> Result<()> {
    #[cfg(windows)]
    if dst.exists() {
        if let Err(e) = fs::remove_file(dst) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(e).with_context(|| {
                    format!("remove existing destination before rename: {}", dst.display())
                });
            }
        }
    }

    fs::rename(src, dst)
        .with_context(|| format!("atomic rename '{}' -> '{}'", src.display(), dst.display()))?;

    #[cfg(unix)]
    if let Some(parent) = dst.parent() {
        // The rename already happened; a failed dir fsync should not turn it into an error.
        let _ = super::util::fsync_dir(parent);
    }

    Ok(())
}
