//! Core configuration types.
//! - Config holds runtime settings with sensible defaults.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::paths;
use super::{DEFAULT_LOCK_TIMEOUT_SECS, DEFAULT_VIDEO_EXTENSIONS};
use crate::lock::default_lock_path;

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More info (like verbose)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration for one organizer run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Inbox scanned for new media
    pub input_dir: PathBuf,
    /// Library roots indexed for destination folders
    pub series_dirs: Vec<PathBuf>,
    /// Names skipped in the inbox and the library roots
    pub ignore: Vec<String>,
    /// When non-empty, only these inbox names are considered
    pub whitelist: Vec<String>,
    /// Extensions (without dot) classified as video
    pub video_extensions: Vec<String>,
    pub rulebook: PathBuf,
    pub failure_store: PathBuf,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    /// How long to wait for another run to release the lock
    pub lock_timeout: Duration,
    pub lock_file: PathBuf,
    /// If true, log actions but do not modify the filesystem
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            series_dirs: Vec::new(),
            ignore: Vec::new(),
            whitelist: Vec::new(),
            video_extensions: DEFAULT_VIDEO_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            rulebook: paths::default_rulebook_path().unwrap_or_else(|| PathBuf::from("rule_book.xml")),
            failure_store: paths::default_failure_store_path()
                .unwrap_or_else(|| PathBuf::from("failures.json")),
            log_level: LogLevel::Normal,
            log_file: None,
            lock_timeout: Duration::from_secs(DEFAULT_LOCK_TIMEOUT_SECS),
            lock_file: default_lock_path(),
            dry_run: false,
        }
    }
}

impl Config {
    /// Construct a Config with explicit inbox, library roots and rule book; other fields use defaults.
    pub fn new(
        input_dir: impl Into<PathBuf>,
        series_dirs: Vec<PathBuf>,
        rulebook: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            series_dirs,
            rulebook: rulebook.into(),
            ..Default::default()
        }
    }
}
