//! Default path helpers and symlink checks.
//! Determines OS-appropriate config/state/log paths and detects symlinked ancestors for safety.

use dirs::{config_dir, data_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "VFO_CONFIG";

const APP_DIR: &str = "vfo";

fn config_base() -> Option<PathBuf> {
    config_dir()
        .map(|b| b.join(APP_DIR))
        .or_else(|| env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config").join(APP_DIR)))
}

fn data_base() -> Option<PathBuf> {
    data_dir().map(|b| b.join(APP_DIR)).or_else(|| {
        env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join(".local").join("share").join(APP_DIR))
    })
}

/// Config file in use: `$VFO_CONFIG` when set, else the OS-appropriate default.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(p));
    }
    config_base().map(|b| b.join("config.xml"))
}

/// Rule book next to the default config.
pub fn default_rulebook_path() -> Option<PathBuf> {
    config_base().map(|b| b.join("rule_book.xml"))
}

/// Failure store in the data dir.
pub fn default_failure_store_path() -> Option<PathBuf> {
    data_base().map(|b| b.join("failures.json"))
}

/// OS-appropriate default log file path (data dir).
pub fn default_log_path() -> Option<PathBuf> {
    data_base().map(|b| b.join("vfo.log"))
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.exists() {
            let meta = fs::symlink_metadata(anc)?;
            if meta.file_type().is_symlink() {
                return Ok(true);
            }
        }
        p = anc.parent();
    }
    Ok(false)
}
