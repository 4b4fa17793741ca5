//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - --debug is a shorthand for --log-level debug.
//! - --series-dir replaces the configured library roots when given at least once.

use clap::{Parser, ValueHint};
use std::path::PathBuf;

use crate::config::types::{Config, LogLevel};

/// Organize downloaded video files into a series library.
/// CLI flags override config values (which are loaded from XML).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "vfo",
    author,
    version,
    about = "Sort downloaded episodes from an inbox into a series library"
)]
pub struct Args {
    /// Config file to use instead of $VFO_CONFIG or the platform default.
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Override the inbox directory.
    #[arg(long, value_hint = ValueHint::DirPath, help = "Override the inbox directory")]
    pub input_dir: Option<PathBuf>,

    /// Library root; repeat for several roots.
    #[arg(
        long = "series-dir",
        value_name = "DIR",
        value_hint = ValueHint::DirPath,
        help = "Library root (repeatable; replaces configured roots)"
    )]
    pub series_dirs: Vec<PathBuf>,

    /// Override the rule book path.
    #[arg(long, value_hint = ValueHint::FilePath, help = "Override the rule book path")]
    pub rulebook: Option<PathBuf>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(
        short = 'd',
        long,
        help = "Enable debug logging (shorthand for --log-level debug)"
    )]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    /// Emit logs in structured JSON (includes timestamp, level, and structured fields).
    #[arg(long, help = "Emit logs in structured JSON")]
    pub json: bool,

    /// Dry-run: log actions but do not modify the filesystem.
    #[arg(
        long,
        help = "Show what would be done, but do not copy, create or delete anything"
    )]
    pub dry_run: bool,

    /// Print where vfo will look for the config file, then exit.
    #[arg(long, help = "Print the config file location used by vfo and exit")]
    pub print_config: bool,
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(dir) = &self.input_dir {
            cfg.input_dir = dir.clone();
        }
        if !self.series_dirs.is_empty() {
            cfg.series_dirs = self.series_dirs.clone();
        }
        if let Some(rb) = &self.rulebook {
            cfg.rulebook = rb.clone();
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if self.dry_run {
            cfg.dry_run = true;
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
