//! Failure store.
//!
//! Remembers files that could not be placed so later runs skip them instead of
//! failing the same way every time. The content hash is the identity: renaming a
//! failed file does not make it new, changing its bytes does.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::platform::write_private_atomic;

/// Persistent record of failed inputs.
pub trait FailureStore: Send + Sync {
    /// Stored message for this content, if it failed before.
    fn lookup(&self, name: &str, hash: &str) -> Option<String>;
    fn record(&mut self, name: &str, hash: &str, message: &str);
    fn persist(&self) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub name: String,
    pub message: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FailureFile {
    #[serde(default)]
    failures: BTreeMap<String, FailureRecord>,
}

/// JSON-file backed store keyed by content hash.
#[derive(Debug)]
pub struct JsonFailureStore {
    path: PathBuf,
    data: FailureFile,
    dirty: bool,
}

impl JsonFailureStore {
    /// Open the store at `path`; a missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        let data = match fs::read_to_string(path) {
            Ok(s) if s.trim().is_empty() => FailureFile::default(),
            Ok(s) => serde_json::from_str(&s)
                .with_context(|| format!("parse failure store '{}'", path.display()))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => FailureFile::default(),
            Err(e) => {
                return Err(e).with_context(|| format!("read failure store '{}'", path.display()));
            }
        };
        debug!(path = %path.display(), records = data.failures.len(), "failure store opened");
        Ok(Self {
            path: path.to_path_buf(),
            data,
            dirty: false,
        })
    }

    pub fn len(&self) -> usize {
        self.data.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.failures.is_empty()
    }

    pub fn get(&self, hash: &str) -> Option<&FailureRecord> {
        self.data.failures.get(hash)
    }
}

impl FailureStore for JsonFailureStore {
    fn lookup(&self, name: &str, hash: &str) -> Option<String> {
        let rec = self.data.failures.get(hash)?;
        if rec.name != name {
            debug!(file = name, recorded_as = %rec.name, "known failure under a different name");
        }
        Some(rec.message.clone())
    }

    fn record(&mut self, name: &str, hash: &str, message: &str) {
        self.data.failures.insert(
            hash.to_string(),
            FailureRecord {
                name: name.to_string(),
                message: message.to_string(),
                recorded_at: Utc::now(),
            },
        );
        self.dirty = true;
    }

    fn persist(&self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let json = serde_json::to_vec_pretty(&self.data).context("serialize failure store")?;
        write_private_atomic(&self.path, &json)
            .with_context(|| format!("write failure store '{}'", self.path.display()))?;
        info!(path = %self.path.display(), records = self.len(), "failure store saved");
        Ok(())
    }
}
