//! Matcher stage: metadata extraction -> rule book resolution -> folder resolution.
//!
//! Each sub-stage fills in one part of the MediaFile and the chain stops at the first
//! failure. Lookups are read-only, so one `Matcher` is shared across worker threads.

use tracing::{debug, info};

use crate::entries::MediaFile;
use crate::errors::MatchError;
use crate::folders::{FolderEntry, FolderIndex};
use crate::fuzzy::best_match;
use crate::metadata::{MediaKind, Metadata, MetadataExtractor};
use crate::rules::{Rule, RuleBook};

/// Minimum similarity between a title and a rule book name.
pub const RULEBOOK_CUTOFF: f64 = 0.7;
/// Minimum similarity between a title and a library folder name.
pub const FOLDER_CUTOFF: f64 = 0.6;

pub struct Matcher<'a> {
    extractor: &'a dyn MetadataExtractor,
    rulebook: &'a RuleBook,
    folders: &'a FolderIndex,
}

impl<'a> Matcher<'a> {
    pub fn new(
        extractor: &'a dyn MetadataExtractor,
        rulebook: &'a RuleBook,
        folders: &'a FolderIndex,
    ) -> Self {
        Self {
            extractor,
            rulebook,
            folders,
        }
    }

    /// Run all three sub-stages on `file`.
    ///
    /// Metadata is stored on the file even when it is incomplete; rules are stored
    /// before folder resolution runs.
    pub fn match_file(&self, file: &mut MediaFile) -> Result<(), MatchError> {
        let guessed = self.extractor.extract(&file.name);
        let checked = require_title_and_type(&file.name, &guessed);
        let meta = file.metadata.insert(guessed);
        checked?;
        file.rules = self.resolve_rules(&file.name, meta)?;
        file.folder = Some(self.resolve_folder(&file.name, meta)?.clone());
        Ok(())
    }

    /// Find the rule book entry for the title (episodes only).
    fn resolve_rules(&self, name: &str, meta: &Metadata) -> Result<Vec<Rule>, MatchError> {
        match meta.kind {
            Some(MediaKind::Episode) => {}
            other => {
                let kind = other.map(|k| k.to_string()).unwrap_or_else(|| "unknown".into());
                info!(file = %name, kind = %kind, "no rule handler");
                return Err(MatchError::NoRuleHandler {
                    kind,
                    name: name.to_string(),
                });
            }
        }
        let title = meta.title.as_deref().unwrap_or_default();

        let mut found = best_match(title, self.rulebook.names(), RULEBOOK_CUTOFF);
        if found.is_none()
            && let Some(alt) = meta.alternative_title.as_deref()
        {
            let combined = format!("{title} {alt}");
            debug!(file = %name, query = %combined, "retrying rule book match with alternative title");
            found = best_match(&combined, self.rulebook.names(), RULEBOOK_CUTOFF);
        }

        let Some(m) = found else {
            info!(file = %name, title, "no rule book entry matched");
            return Err(MatchError::NoRuleEntry(name.to_string()));
        };
        let rules = self.rulebook.get(m.candidate).unwrap_or_default().to_vec();
        info!(file = %name, series = m.candidate, score = m.score, rules = rules.len(), "rule book entry matched");
        Ok(rules)
    }

    /// Find the library folder for the title.
    fn resolve_folder(&self, name: &str, meta: &Metadata) -> Result<&'a FolderEntry, MatchError> {
        let title = meta.title.as_deref().unwrap_or_default();
        best_match(title, self.folders.names(), FOLDER_CUTOFF)
            .and_then(|m| {
                info!(file = %name, folder = m.candidate, score = m.score, "folder matched");
                self.folders.lookup_by_name(m.candidate)
            })
            .ok_or_else(|| {
                info!(file = %name, title, "no folder matched");
                MatchError::NoFolderMatch(name.to_string())
            })
    }
}

/// Title and type are both required before any lookup runs.
fn require_title_and_type(name: &str, meta: &Metadata) -> Result<(), MatchError> {
    let missing = if meta.title.is_none() {
        MatchError::MissingTitle(name.to_string())
    } else if meta.kind.is_none() {
        MatchError::MissingType(name.to_string())
    } else {
        return Ok(());
    };
    info!(file = %name, reason = %missing, "metadata incomplete");
    Err(missing)
}
