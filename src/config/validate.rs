//! Config validation logic.
//! Verifies the inbox and library roots exist, are directories, and do not overlap.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use super::types::Config;
use crate::errors::VfoError;

impl Config {
    /// Validate directory existence and layout before a run.
    pub fn validate(&self) -> Result<()> {
        let input = &self.input_dir;

        // 1) Inbox: must exist, be a directory, and be readable.
        if !input.is_dir() {
            error!(path = %input.display(), "input_dir missing or not a directory");
            return Err(VfoError::InputInvalid(input.clone()).into());
        }
        ensure_readable(input, "input_dir")?;

        // 2) Library roots: at least one; each must be a directory.
        if self.series_dirs.is_empty() {
            bail!("no series_dir configured");
        }
        let input_real = fs::canonicalize(input).unwrap_or_else(|_| input.clone());
        for dir in &self.series_dirs {
            if !dir.is_dir() {
                error!(path = %dir.display(), "series_dir missing or not a directory");
                return Err(VfoError::SeriesDirInvalid(dir.clone()).into());
            }

            // 3) The inbox must not be (or sit inside) a library root.
            let dir_real = fs::canonicalize(dir).unwrap_or_else(|_| dir.clone());
            if input_real == dir_real {
                bail!(
                    "input_dir and series_dir resolve to the same path: '{}'",
                    dir_real.display()
                );
            }
            if input_real.starts_with(&dir_real) {
                bail!(
                    "input_dir '{}' must not be inside series_dir '{}'",
                    input_real.display(),
                    dir_real.display()
                );
            }
        }

        // 4) Rule book must be present; an empty one is fine.
        if !self.rulebook.is_file() {
            return Err(VfoError::RuleBookMissing(self.rulebook.clone()).into());
        }

        info!(
            input = %input.display(),
            series_dirs = self.series_dirs.len(),
            rulebook = %self.rulebook.display(),
            dry_run = self.dry_run,
            "config validated"
        );
        Ok(())
    }
}

/// Ensure directory is readable by attempting to open its entries.
fn ensure_readable(path: &Path, name: &str) -> Result<()> {
    fs::read_dir(path).with_context(|| {
        format!("Cannot read {name} directory '{}'; check permissions", path.display())
    })?;
    debug!("{name} readable: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;

    fn layout() -> (TempDir, Config) {
        let td = TempDir::new().unwrap();
        td.child("inbox").create_dir_all().unwrap();
        td.child("series").create_dir_all().unwrap();
        td.child("rule_book.xml").write_str("<rulebook/>").unwrap();
        let cfg = Config::new(
            td.child("inbox").path(),
            vec![td.child("series").to_path_buf()],
            td.child("rule_book.xml").path(),
        );
        (td, cfg)
    }

    #[test]
    fn valid_layout_passes() {
        let (_td, cfg) = layout();
        cfg.validate().unwrap();
    }

    #[test]
    fn missing_inbox_is_typed() {
        let (td, mut cfg) = layout();
        cfg.input_dir = td.child("nope").to_path_buf();
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err.downcast_ref::<VfoError>(), Some(VfoError::InputInvalid(_))));
    }

    #[test]
    fn series_dir_must_be_directory() {
        let (td, mut cfg) = layout();
        td.child("file").write_str("x").unwrap();
        cfg.series_dirs.push(td.child("file").to_path_buf());
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.downcast_ref::<VfoError>().map(VfoError::code), Some(11));
    }

    #[test]
    fn inbox_inside_library_is_rejected() {
        let (td, mut cfg) = layout();
        td.child("series/inbox").create_dir_all().unwrap();
        cfg.input_dir = td.child("series/inbox").to_path_buf();
        assert!(cfg.validate().unwrap_err().to_string().contains("must not be inside"));

        cfg.input_dir = td.child("series").to_path_buf();
        assert!(cfg.validate().unwrap_err().to_string().contains("same path"));
    }

    #[test]
    fn missing_rulebook_is_typed() {
        let (td, mut cfg) = layout();
        cfg.rulebook = td.child("missing.xml").to_path_buf();
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err.downcast_ref::<VfoError>(), Some(VfoError::RuleBookMissing(_))));
    }
}
