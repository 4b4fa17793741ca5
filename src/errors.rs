//! Typed error definitions for vfo.
//! Provides a small set of well-known failure modes for better logs and tests.
//!
//! - `MatchError`: per-file failures; stored on the MediaFile, never propagated across files.
//! - `RuleParseError`: rule book problems caught when the rule book is loaded.
//! - `VfoError`: run-level failures that the CLI reports with a stable code.

use std::path::PathBuf;
use thiserror::Error;

/// Why a single media file could not be placed.
///
/// The `Display` text is what ends up in the failure store, so keep it stable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("unable to determine title for '{0}'")]
    MissingTitle(String),

    #[error("unable to determine type for '{0}'")]
    MissingType(String),

    #[error("no rule handler for type '{kind}': {name}")]
    NoRuleHandler { kind: String, name: String },

    #[error("no rule entry found for '{0}'")]
    NoRuleEntry(String),

    #[error("no folder match for '{0}'")]
    NoFolderMatch(String),

    #[error("no destination resolved for '{0}'")]
    NoDestination(String),

    #[error("failed to create season directory '{path}': {reason}")]
    SeasonDir { path: PathBuf, reason: String },

    #[error("destination '{dest}' already claimed by '{claimed_by}'")]
    DestinationClaimed { dest: PathBuf, claimed_by: String },

    #[error("failed to hash '{path}': {reason}")]
    Hash { path: PathBuf, reason: String },

    /// Skipped because the failure store already holds a record for the content hash.
    #[error("{0}")]
    PreviouslyFailed(String),
}

impl MatchError {
    /// Whether this failure should be written to the failure store.
    pub fn is_recordable(&self) -> bool {
        !matches!(self, MatchError::PreviouslyFailed(_) | MatchError::Hash { .. })
    }
}

/// Problems found while parsing a rule book entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleParseError {
    #[error("unknown rule '{token}' for series '{series}'")]
    UnknownRule { series: String, token: String },

    #[error("rule '{rule}' for series '{series}' requires an argument")]
    MissingArgument { series: String, rule: String },

    #[error("unbalanced quotes in rules for series '{0}'")]
    Unquote(String),

    #[error("duplicate rule book entry for series '{0}'")]
    Duplicate(String),
}

/// Run-level failures.
#[derive(Debug, Error)]
pub enum VfoError {
    #[error("input directory invalid or not a directory: {0}")]
    InputInvalid(PathBuf),

    #[error("series directory invalid or not a directory: {0}")]
    SeriesDirInvalid(PathBuf),

    #[error("rule book not found: {0}")]
    RuleBookMissing(PathBuf),

    #[error("copy failed {src} -> {dest}: {reason}")]
    CopyFailed {
        src: PathBuf,
        dest: PathBuf,
        reason: String,
    },

    #[error("Operation interrupted by user")]
    Interrupted,
}

impl VfoError {
    /// Stable numeric code for structured logs.
    pub fn code(&self) -> u16 {
        match self {
            VfoError::InputInvalid(_) => 10,
            VfoError::SeriesDirInvalid(_) => 11,
            VfoError::RuleBookMissing(_) => 12,
            VfoError::CopyFailed { .. } => 20,
            VfoError::Interrupted => 130,
        }
    }
}
