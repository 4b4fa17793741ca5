//! Library folder index.
//!
//! Two levels only: the top-level directories of every configured library root, plus
//! the immediate children of each. Built once per run and read-only afterwards, so it
//! can be shared across worker threads.

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::fs_ops::io_error_with_help;

/// An immediate child of a library folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderChild {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// A top-level library folder (usually one series).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    pub name: String,
    pub path: PathBuf,
    pub children: Vec<FolderChild>,
}

impl FolderEntry {
    /// Child directory with exactly this name.
    pub fn child_dir(&self, name: &str) -> Option<&FolderChild> {
        self.children.iter().find(|c| c.is_dir && c.name == name)
    }
}

/// Name-keyed index over library roots.
#[derive(Debug, Default)]
pub struct FolderIndex {
    entries: Vec<FolderEntry>,
    by_name: HashMap<String, usize>,
}

impl FolderIndex {
    /// Index the top-level directories of `roots`, in root order.
    ///
    /// A name seen in a later root replaces the earlier entry in place.
    pub fn build(roots: &[PathBuf], ignore: &[String]) -> Result<Self> {
        let mut index = FolderIndex::default();
        for root in roots {
            let mut dirs = Vec::new();
            let rd = fs::read_dir(root).map_err(io_error_with_help("scan library root", root))?;
            for item in rd {
                let item = item.map_err(io_error_with_help("read library root entry", root))?;
                let name = item.file_name().to_string_lossy().into_owned();
                if ignore.iter().any(|i| i == &name) {
                    continue;
                }
                let path = item.path();
                if path.is_dir() {
                    dirs.push((name, path));
                }
            }
            dirs.sort_by(|a, b| a.0.cmp(&b.0));
            for (name, path) in dirs {
                let children = read_children(&path);
                index.insert(FolderEntry {
                    name,
                    path,
                    children,
                });
            }
        }
        debug!(roots = roots.len(), folders = index.len(), "folder index built");
        Ok(index)
    }

    fn insert(&mut self, entry: FolderEntry) {
        match self.by_name.get(&entry.name) {
            Some(&i) => {
                debug!(
                    name = %entry.name,
                    old = %self.entries[i].path.display(),
                    new = %entry.path.display(),
                    "folder name collision across roots; later root wins"
                );
                self.entries[i] = entry;
            }
            None => {
                self.by_name.insert(entry.name.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<&FolderEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    /// Top-level names in root order, then sorted by name within a root.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn read_children(dir: &Path) -> Vec<FolderChild> {
    let rd = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot list library folder; indexing without children");
            return Vec::new();
        }
    };
    let mut children: Vec<FolderChild> = rd
        .filter_map(|r| r.ok())
        .map(|item| {
            let path = item.path();
            FolderChild {
                name: item.file_name().to_string_lossy().into_owned(),
                is_dir: path.is_dir(),
                path,
            }
        })
        .collect();
    children.sort_by(|a, b| a.name.cmp(&b.name));
    children
}
