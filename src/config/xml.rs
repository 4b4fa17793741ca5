//! XML configuration support.
//! - Loads settings from config.xml (quick_xml).
//! - Creates a secure template (and an empty rule book) if the default config is missing.
//!
//! Notes:
//! - This module only reads/writes the config file; directory validation happens elsewhere.
//! - Unknown XML fields are a hard error to surface misconfigurations early.
//! - Repeated elements (`series_dir`, `ignore`, ...) must be written next to each other.

use anyhow::{Context, Result, anyhow, bail};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use super::paths::{
    CONFIG_ENV, default_config_path, default_failure_store_path, default_log_path,
    default_rulebook_path, path_has_symlink_ancestor,
};
use crate::config::types::{Config, LogLevel};
use crate::platform::{set_dir_mode_0700, set_file_mode_0600, write_config_secure_new_0600};
use crate::rules::book::create_template_rulebook;

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    input_dir: Option<String>,
    #[serde(rename = "series_dir", default)]
    series_dirs: Vec<String>,
    #[serde(default)]
    ignore: Vec<String>,
    #[serde(default)]
    whitelist: Vec<String>,
    #[serde(rename = "video_extension", default)]
    video_extensions: Vec<String>,
    rulebook: Option<String>,
    failure_store: Option<String>,
    log_level: Option<String>,
    log_file: Option<String>,
    lock_file: Option<String>,
    #[serde(default, deserialize_with = "de_u64_trimmed_opt")]
    lock_timeout_seconds: Option<u64>,
}

/// Outcome of locating the config file.
#[derive(Debug)]
pub enum LoadResult {
    Loaded(Box<Config>, PathBuf),
    /// The default config was missing; a template was written and should be edited first.
    CreatedTemplate(PathBuf),
}

// Trims surrounding whitespace; unparsable values fall back to the default.
fn de_u64_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| s.trim().parse::<u64>().ok()))
}

fn non_empty_path(s: Option<&str>) -> Option<PathBuf> {
    s.map(str::trim).filter(|t| !t.is_empty()).map(PathBuf::from)
}

fn trimmed_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Map XmlConfig -> Config
fn xml_to_config(parsed: XmlConfig) -> Config {
    let mut cfg = Config::default();

    if let Some(p) = non_empty_path(parsed.input_dir.as_deref()) {
        cfg.input_dir = p;
    }
    cfg.series_dirs = trimmed_list(parsed.series_dirs)
        .into_iter()
        .map(PathBuf::from)
        .collect();
    cfg.ignore = trimmed_list(parsed.ignore);
    cfg.whitelist = trimmed_list(parsed.whitelist);
    let exts = trimmed_list(parsed.video_extensions);
    if !exts.is_empty() {
        cfg.video_extensions = exts;
    }
    if let Some(p) = non_empty_path(parsed.rulebook.as_deref()) {
        cfg.rulebook = p;
    }
    if let Some(p) = non_empty_path(parsed.failure_store.as_deref()) {
        cfg.failure_store = p;
    }
    cfg.log_file = non_empty_path(parsed.log_file.as_deref());
    if let Some(p) = non_empty_path(parsed.lock_file.as_deref()) {
        cfg.lock_file = p;
    }
    if let Some(level) = parsed
        .log_level
        .as_deref()
        .and_then(|s| s.trim().parse::<LogLevel>().ok())
    {
        cfg.log_level = level;
    }
    if let Some(secs) = parsed.lock_timeout_seconds {
        cfg.lock_timeout = Duration::from_secs(secs);
    }
    cfg
}

/// Parse config XML text.
pub fn config_from_xml_str(xml: &str) -> Result<Config> {
    let parsed: XmlConfig = from_xml_str(xml)?;
    Ok(xml_to_config(parsed))
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let cfg = config_from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    debug!(path = %path.display(), series_dirs = cfg.series_dirs.len(), "config loaded");
    Ok(cfg)
}

/// Load the config from `explicit` (CLI), `$VFO_CONFIG` or the default location.
///
/// Only the default location is templated when missing; an explicit path that
/// does not exist is an error.
pub fn load_or_init(explicit: Option<&Path>) -> Result<LoadResult> {
    let from_user = explicit.is_some() || env::var_os(CONFIG_ENV).is_some();
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => default_config_path().ok_or_else(|| anyhow!("could not determine a config path"))?,
    };

    if !path.exists() {
        if from_user {
            bail!("config file not found: {}", path.display());
        }
        create_template_config(&path)?;
        if let Some(rb) = default_rulebook_path()
            && !rb.exists()
        {
            create_template_rulebook(&rb)?;
        }
        return Ok(LoadResult::CreatedTemplate(path));
    }

    let cfg = load_config_from_xml_path(&path)?;
    Ok(LoadResult::Loaded(Box::new(cfg), path))
}

/// Create the default template config file and parent directory (best-effort permissions).
/// Uses secure creation to avoid following attacker-controlled symlinks on Unix.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        bail!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
        let _ = set_dir_mode_0700(parent);
    }

    let show = |p: Option<PathBuf>, fallback: &str| {
        p.map(|p| p.display().to_string()).unwrap_or_else(|| fallback.into())
    };
    let content = format!(
        "<!--\n  vfo configuration (XML)\n\n  input_dir             -> inbox scanned for new video files\n  series_dir            -> library root holding one folder per series (repeatable)\n  ignore                -> inbox or library entry name to skip (repeatable)\n  whitelist             -> when present, only these inbox names are processed (repeatable)\n  video_extension       -> extension treated as video, without the dot (repeatable)\n  rulebook              -> rule book XML mapping series names to placement rules\n  failure_store         -> JSON file remembering files that could not be placed\n  log_level             -> quiet | normal | info | debug\n  log_file              -> path to log file (optional; stdout is still used)\n  lock_timeout_seconds  -> how long to wait for a concurrent run to finish\n\n  CLI flags override XML values. Keep repeated elements next to each other.\n-->\n<config>\n  <input_dir>/path/to/inbox</input_dir>\n  <series_dir>/path/to/series</series_dir>\n  <ignore>incomplete</ignore>\n  <rulebook>{}</rulebook>\n  <failure_store>{}</failure_store>\n  <log_level>normal</log_level>\n  <log_file>{}</log_file>\n  <lock_timeout_seconds>{}</lock_timeout_seconds>\n</config>\n",
        show(default_rulebook_path(), "/path/to/rule_book.xml"),
        show(default_failure_store_path(), "/path/to/failures.json"),
        show(default_log_path(), "/path/to/vfo.log"),
        super::DEFAULT_LOCK_TIMEOUT_SECS,
    );

    // Atomic, secure write (O_NOFOLLOW + create_new on Unix), then tighten perms.
    write_config_secure_new_0600(path, content.as_bytes())?;
    let _ = set_file_mode_0600(path);

    info!(path = %path.display(), "created template config");
    Ok(())
}
