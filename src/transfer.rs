//! Transfer engine.
//!
//! A `TransferSession` copies each planned file into the library and queues what
//! should be removed from the inbox afterwards: the release root when the plan names
//! one, the bare source otherwise. Nothing is deleted until `finish()` runs, so a
//! copy error (which propagates out of `transfer`) leaves every source in place.
//! Dropping a session without finishing it deletes nothing.

use anyhow::{Result, bail};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::entries::MediaFile;
use crate::errors::VfoError;
use crate::fs_ops::safe_copy_and_rename;

/// Where a file goes and what to clean up once it is there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Release directory to delete instead of the bare source.
    pub delete_root: Option<PathBuf>,
}

/// Outcome of the deferred deletion phase.
#[derive(Debug, Default)]
pub struct FinishReport {
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

#[derive(Debug)]
pub struct TransferSession {
    dry_run: bool,
    delete_queue: Vec<PathBuf>,
    /// Sources copied out of each queued release root.
    root_members: HashMap<PathBuf, Vec<PathBuf>>,
}

impl TransferSession {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            delete_queue: Vec::new(),
            root_members: HashMap::new(),
        }
    }

    /// Copy one valid, planned file to its destination and queue its cleanup.
    pub fn transfer<'f>(&mut self, file: &'f MediaFile) -> Result<&'f Path> {
        if !file.is_valid() {
            bail!("refusing to transfer invalid file '{}'", file.name);
        }
        let Some(plan) = file.plan.as_ref() else {
            bail!("refusing to transfer '{}' without a plan", file.name);
        };

        if self.dry_run {
            info!(file = %file.name, dest = %plan.destination.display(), "dry-run: would copy");
        } else {
            info!(file = %file.name, dest = %plan.destination.display(), "copying");
            safe_copy_and_rename(&plan.source, &plan.destination).map_err(|e| VfoError::CopyFailed {
                src: plan.source.clone(),
                dest: plan.destination.clone(),
                reason: format!("{e:#}"),
            })?;
        }

        if let Some(root) = &plan.delete_root {
            self.root_members
                .entry(root.clone())
                .or_default()
                .push(plan.source.clone());
        }
        let queued = plan.delete_root.as_ref().unwrap_or(&plan.source);
        debug!(path = %queued.display(), "queued for deletion");
        self.delete_queue.push(queued.clone());
        Ok(&plan.destination)
    }

    pub fn queued(&self) -> &[PathBuf] {
        &self.delete_queue
    }

    /// Stop `root` from being deleted whole; the files already copied out of it are
    /// queued individually instead.
    pub fn hold_root(&mut self, root: &Path) {
        if !self.delete_queue.iter().any(|p| p == root) {
            return;
        }
        let members = self.root_members.remove(root).unwrap_or_default();
        self.delete_queue.retain(|p| p != root);
        info!(release = %root.display(), files = members.len(), "release held; deleting copied files only");
        self.delete_queue.extend(members);
    }

    /// Deduplicate the queue and delete each path. A failure affects only that path.
    pub fn finish(mut self) -> FinishReport {
        let queue = dedupe(std::mem::take(&mut self.delete_queue));
        let mut report = FinishReport::default();
        for path in queue {
            if self.dry_run {
                info!(path = %path.display(), "dry-run: would delete");
                report.deleted.push(path);
                continue;
            }
            match remove_path(&path) {
                Ok(()) => {
                    info!(path = %path.display(), "deleted");
                    report.deleted.push(path);
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "failed to delete source");
                    report.failed.push((path, e.to_string()));
                }
            }
        }
        report
    }
}

impl Drop for TransferSession {
    fn drop(&mut self) {
        if !self.delete_queue.is_empty() {
            warn!(
                pending = self.delete_queue.len(),
                "transfer session closed without finishing; sources left in place"
            );
        }
    }
}

/// Drop exact duplicates and paths already covered by a queued ancestor, keeping order.
fn dedupe(queue: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let unique: Vec<PathBuf> = queue.into_iter().filter(|p| seen.insert(p.clone())).collect();
    unique
        .iter()
        .filter(|p| !unique.iter().any(|other| other != *p && p.starts_with(other)))
        .cloned()
        .collect()
}

fn remove_path(path: &Path) -> std::io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    let ft = meta.file_type();
    if ft.is_file() {
        fs::remove_file(path)
    } else if ft.is_dir() {
        fs::remove_dir_all(path)
    } else {
        Err(std::io::Error::other(format!(
            "unsupported path type for deletion: {}",
            path.display()
        )))
    }
}
