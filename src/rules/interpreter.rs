//! Rule interpretation.
//!
//! Rules run left to right over an accumulator holding the destination directory
//! and an optional replacement file name. Metadata edits made by one rule
//! (`episode-only`, `alternative-title`) are visible to the rules after it, which
//! is why `episode-only` usually precedes `format-title`.
//!
//! The only filesystem mutation here is creating a missing season directory, and it
//! is skipped in dry-run mode.

use regex::Regex;
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::{debug, info};

use super::Rule;
use crate::entries::MediaFile;
use crate::errors::MatchError;
use crate::folders::FolderEntry;
use crate::metadata::Metadata;
use crate::transfer::TransferPlan;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("placeholder pattern"));

/// Knobs for planning.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanContext {
    pub dry_run: bool,
}

#[derive(Debug, Default)]
struct Accumulator {
    dir: Option<PathBuf>,
    file_name: Option<String>,
}

/// Apply the file's rules and produce its transfer plan.
///
/// Requires the matcher stage to have assigned metadata, rules and a folder.
pub fn plan_transfer(file: &mut MediaFile, ctx: &PlanContext) -> Result<TransferPlan, MatchError> {
    let name = file.name.as_str();
    let folder = file
        .folder
        .as_ref()
        .ok_or_else(|| MatchError::NoFolderMatch(name.to_string()))?;
    let meta = file.metadata.get_or_insert_with(Metadata::default);

    let mut acc = Accumulator::default();
    for rule in &file.rules {
        match rule {
            Rule::Season => apply_season(name, meta, folder, &mut acc, ctx)?,
            Rule::ParentDir => {
                acc.dir = Some(folder.path.clone());
                debug!(file = name, dest = %folder.path.display(), "rule 'parent-dir' applied");
            }
            Rule::SubDir(sub) => match folder.child_dir(sub) {
                Some(child) => {
                    acc.dir = Some(child.path.clone());
                    debug!(file = name, dest = %child.path.display(), "rule 'sub-dir' applied");
                }
                None => info!(file = name, sub_dir = %sub, "rule 'sub-dir' skipped: no such child folder"),
            },
            Rule::FormatTitle(template) => match (&meta.container, &acc.dir) {
                (Some(container), Some(_)) => {
                    let rendered = format!("{}.{}", render_template(template, meta), container);
                    debug!(file = name, new_name = %rendered, "rule 'format-title' applied");
                    acc.file_name = Some(rendered);
                }
                _ => info!(file = name, "rule 'format-title' skipped: missing container or destination"),
            },
            Rule::EpisodeOnly => apply_episode_only(name, meta),
            Rule::AlternativeTitle => {
                let joined = match (&meta.title, &meta.alternative_title) {
                    (Some(title), Some(alt)) => Some(format!("{title} {alt}")),
                    _ => None,
                };
                match joined {
                    Some(joined) => {
                        debug!(file = name, title = %joined, "rule 'alternative-title' applied");
                        meta.title = Some(joined);
                    }
                    None => info!(file = name, "rule 'alternative-title' skipped: no alternative title"),
                }
            }
        }
    }

    let dir = acc
        .dir
        .ok_or_else(|| MatchError::NoDestination(name.to_string()))?;
    let destination = dir.join(acc.file_name.as_deref().unwrap_or(name));
    Ok(TransferPlan {
        source: file.path.clone(),
        destination,
        delete_root: file.release_root.clone(),
    })
}

fn apply_season(
    name: &str,
    meta: &Metadata,
    folder: &FolderEntry,
    acc: &mut Accumulator,
    ctx: &PlanContext,
) -> Result<(), MatchError> {
    let Some(season) = meta.season else {
        info!(file = name, "rule 'season' skipped: no season number");
        return Ok(());
    };

    if let Some(child) = folder
        .children
        .iter()
        .find(|c| c.is_dir && is_season_dir(&c.name, season))
    {
        acc.dir = Some(child.path.clone());
        debug!(file = name, dest = %child.path.display(), "rule 'season' applied");
        return Ok(());
    }

    let path = folder.path.join(format!("Season {season}"));
    // Another file in this run may already have created it.
    if !path.is_dir() {
        if ctx.dry_run {
            info!(file = name, dir = %path.display(), "dry-run: would create season directory");
        } else {
            fs::create_dir_all(&path).map_err(|e| MatchError::SeasonDir {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            info!(file = name, dir = %path.display(), "created season directory");
        }
    }
    acc.dir = Some(path);
    Ok(())
}

/// "Season 1", "season 1 (2019)" and "SEASON 1" match season 1; "Season 10" does not.
fn is_season_dir(dir_name: &str, season: u64) -> bool {
    let prefix = format!("season {season}");
    let lower = dir_name.to_lowercase();
    lower.starts_with(&prefix)
        && !lower[prefix.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
}

fn apply_episode_only(name: &str, meta: &mut Metadata) {
    let (Some(season), Some(episode)) = (meta.season, meta.episode) else {
        debug!(file = name, "rule 'episode-only' no-op: season or episode missing");
        return;
    };
    match format!("{season}{episode}").parse::<u64>() {
        Ok(combined) => {
            meta.episode = Some(combined);
            meta.season = None;
            debug!(file = name, episode = combined, "rule 'episode-only' applied");
        }
        Err(e) => info!(file = name, error = %e, "rule 'episode-only' skipped: combined number out of range"),
    }
}

/// Substitute `{{field}}` placeholders from the metadata. Unknown or absent fields
/// render empty; path separators in values are replaced so the result stays one
/// path component.
pub fn render_template(template: &str, meta: &Metadata) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures<'_>| {
            meta.get(&caps[1]).unwrap_or_default()
        })
        .replace(['/', '\\'], "-")
}
