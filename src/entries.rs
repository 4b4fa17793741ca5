//! Filesystem entry model for the inbox.
//!
//! Every node under the inbox is classified once as a directory, a plain file or a
//! media file. Directories enumerate their children lazily on first access and keep
//! the result; a re-scan needs a fresh entry. `Inbox::into_media_files` consumes the
//! tree and returns the media files found within the walk depth.

use anyhow::Result;
use sha2::{Digest, Sha256};
use std::cell::OnceCell;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use crate::errors::MatchError;
use crate::folders::FolderEntry;
use crate::fs_ops::io_error_with_help;
use crate::metadata::Metadata;
use crate::rules::Rule;
use crate::transfer::TransferPlan;

/// Block size used when streaming file content through the hasher.
pub const HASH_BLOCK_SIZE: usize = 64 * 1024;

/// Media files are collected down to this many levels below the top-level inbox entries.
pub const MEDIA_WALK_DEPTH: usize = 2;

/// Case-insensitive video extension set.
#[derive(Debug, Clone, Default)]
pub struct VideoExtensions(HashSet<String>);

impl VideoExtensions {
    pub fn new<I, S>(exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            exts.into_iter()
                .map(|e| e.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        )
    }

    pub fn matches(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.0.contains(&e.to_ascii_lowercase()))
    }
}

/// A scanned filesystem node.
#[derive(Debug)]
pub enum Entry {
    Directory(DirectoryEntry),
    PlainFile(PlainFile),
    Media(MediaFile),
}

impl Entry {
    /// Classify a path found at `depth`.
    fn classify(name: String, path: PathBuf, depth: usize, exts: &Arc<VideoExtensions>) -> Self {
        let is_dir = fs::metadata(&path).map(|m| m.is_dir()).unwrap_or(false);
        if is_dir {
            Entry::Directory(DirectoryEntry {
                name,
                path,
                depth,
                exts: Arc::clone(exts),
                children: OnceCell::new(),
            })
        } else if exts.matches(&name) {
            Entry::Media(MediaFile::new(name, path, depth))
        } else {
            Entry::PlainFile(PlainFile { name, path, depth })
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Entry::Directory(d) => &d.name,
            Entry::PlainFile(f) => &f.name,
            Entry::Media(m) => &m.name,
        }
    }
}

#[derive(Debug)]
pub struct PlainFile {
    pub name: String,
    pub path: PathBuf,
    pub depth: usize,
}

/// Directory whose children are read on first access.
#[derive(Debug)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: PathBuf,
    pub depth: usize,
    exts: Arc<VideoExtensions>,
    children: OnceCell<Vec<Entry>>,
}

impl DirectoryEntry {
    /// Children of this directory, scanned once and cached.
    pub fn children(&self) -> io::Result<&[Entry]> {
        if let Some(c) = self.children.get() {
            return Ok(c);
        }
        let scanned = scan(&self.path, self.depth + 1, &self.exts)?;
        Ok(self.children.get_or_init(|| scanned))
    }

    fn into_children(self) -> Vec<Entry> {
        self.children.into_inner().unwrap_or_default()
    }
}

/// Non-recursive scan of `dir`; children are tagged with `depth`, sorted by name.
fn scan(dir: &Path, depth: usize, exts: &Arc<VideoExtensions>) -> io::Result<Vec<Entry>> {
    let mut out = Vec::new();
    for item in fs::read_dir(dir)? {
        let item = item?;
        let name = item.file_name().to_string_lossy().into_owned();
        out.push(Entry::classify(name, item.path(), depth, exts));
    }
    out.sort_by(|a, b| a.name().cmp(b.name()));
    trace!(dir = %dir.display(), depth, count = out.len(), "scanned directory");
    Ok(out)
}

/// A video file travelling through the placement pipeline.
#[derive(Debug)]
pub struct MediaFile {
    pub name: String,
    pub path: PathBuf,
    pub depth: usize,
    /// Top-level inbox directory this file was found under, when nested.
    pub release_root: Option<PathBuf>,
    pub metadata: Option<Metadata>,
    pub rules: Vec<Rule>,
    pub folder: Option<FolderEntry>,
    pub plan: Option<TransferPlan>,
    hash: OnceCell<String>,
    error: Option<MatchError>,
}

impl MediaFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, depth: usize) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            depth,
            release_root: None,
            metadata: None,
            rules: Vec::new(),
            folder: None,
            plan: None,
            hash: OnceCell::new(),
            error: None,
        }
    }

    /// SHA-256 of the file content, hex encoded. Computed on first call.
    pub fn hash(&self) -> io::Result<&str> {
        if let Some(h) = self.hash.get() {
            return Ok(h);
        }
        let digest = hash_file(&self.path)?;
        Ok(self.hash.get_or_init(|| digest))
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    pub fn error(&self) -> Option<&MatchError> {
        self.error.as_ref()
    }

    /// Mark the file invalid. Only the first failure is kept.
    pub fn fail(&mut self, err: MatchError) {
        if self.error.is_none() {
            debug!(file = %self.name, reason = %err, "media file marked invalid");
            self.error = Some(err);
        }
    }
}

/// Stream a file through SHA-256 in fixed blocks.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_BLOCK_SIZE];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Name filters applied to the top level of the inbox.
#[derive(Debug, Clone, Default)]
pub struct ScanFilter {
    pub ignore: Vec<String>,
    pub whitelist: Vec<String>,
}

impl ScanFilter {
    /// Ignore wins over the whitelist; an empty whitelist admits everything.
    pub fn admits(&self, name: &str) -> bool {
        if self.ignore.iter().any(|i| i == name) {
            return false;
        }
        self.whitelist.is_empty() || self.whitelist.iter().any(|w| w == name)
    }
}

/// The scanned inbox (depth 0). Owns every entry beneath it.
#[derive(Debug)]
pub struct Inbox {
    pub path: PathBuf,
    entries: Vec<Entry>,
}

impl Inbox {
    /// Scan the top level of `path`, applying the name filter.
    pub fn scan(path: &Path, exts: VideoExtensions, filter: &ScanFilter) -> Result<Self> {
        let exts = Arc::new(exts);
        let mut entries = scan(path, 1, &exts).map_err(io_error_with_help("scan inbox", path))?;
        entries.retain(|e| {
            let keep = filter.admits(e.name());
            if !keep {
                trace!(name = e.name(), "filtered out of inbox scan");
            }
            keep
        });
        debug!(inbox = %path.display(), entries = entries.len(), "inbox scanned");
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Consume the tree and return every media file within the walk depth, in scan order.
    pub fn into_media_files(self) -> Vec<MediaFile> {
        let mut out = Vec::new();
        for entry in self.entries {
            match entry {
                Entry::Media(m) => out.push(m),
                Entry::Directory(d) => {
                    let root = d.path.clone();
                    collect_media(d, 1, &root, &mut out);
                }
                Entry::PlainFile(_) => {}
            }
        }
        out
    }
}

/// `level` counts directories below the inbox; top-level directories are level 1.
fn collect_media(dir: DirectoryEntry, level: usize, root: &Path, out: &mut Vec<MediaFile>) {
    if let Err(e) = dir.children() {
        warn!(dir = %dir.path.display(), error = %e, "skipping unreadable directory");
        return;
    }
    for child in dir.into_children() {
        match child {
            Entry::Media(mut m) => {
                m.release_root = Some(root.to_path_buf());
                out.push(m);
            }
            Entry::Directory(d) if level < MEDIA_WALK_DEPTH => collect_media(d, level + 1, root, out),
            _ => {}
        }
    }
}

/// Every video file under `root`, at any depth. Symlinks are not followed.
///
/// Unlike the media walk this has no depth limit; it is used to decide whether a
/// release directory can be removed whole.
pub fn videos_under(root: &Path, exts: &VideoExtensions) -> io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.map_err(io::Error::other)?;
        if entry.file_type().is_file() && exts.matches(&entry.file_name().to_string_lossy()) {
            out.push(entry.into_path());
        }
    }
    Ok(out)
}
