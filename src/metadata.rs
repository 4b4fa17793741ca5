//! Filename metadata.
//!
//! `Metadata` is the typed result of guessing facts from a release filename.
//! `MetadataExtractor` is the seam the matcher stage calls; `GuessExtractor` is the
//! default regex-based implementation.

use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;
use tracing::trace;

/// What kind of release a filename describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Episode,
    Movie,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MediaKind::Episode => "episode",
            MediaKind::Movie => "movie",
        })
    }
}

/// Facts guessed from a filename. Every field is optional; the extractor never fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: Option<String>,
    pub alternative_title: Option<String>,
    pub kind: Option<MediaKind>,
    pub season: Option<u64>,
    pub episode: Option<u64>,
    pub year: Option<u32>,
    pub container: Option<String>,
    pub screen_size: Option<String>,
    pub release_group: Option<String>,
}

impl Metadata {
    /// Look up a field by its template name (`{{title}}`, `{{episode}}`, ...).
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "title" => self.title.clone(),
            "alternative_title" => self.alternative_title.clone(),
            "type" => self.kind.map(|k| k.to_string()),
            "season" => self.season.map(|n| n.to_string()),
            "episode" => self.episode.map(|n| n.to_string()),
            "year" => self.year.map(|n| n.to_string()),
            "container" => self.container.clone(),
            "screen_size" => self.screen_size.clone(),
            "release_group" => self.release_group.clone(),
            _ => None,
        }
    }
}

/// Source of filename metadata. Implementations are best-effort and must not fail.
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, file_name: &str) -> Metadata;
}

/// Regex-based guesser for common scene and library naming styles.
#[derive(Debug, Default, Clone, Copy)]
pub struct GuessExtractor;

static EPISODE_MARKERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bS(\d{1,3})[ ._-]?E(\d{1,4})",
        r"\b(\d{1,2})[xX](\d{2,3})\b",
        r"(?i)\bseason[ ._-]*(\d{1,3})[ ._-]*episode[ ._-]*(\d{1,4})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("episode marker pattern"))
    .collect()
});
static YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").expect("year pattern"));
static SCREEN_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{3,4}[pi]|4k|uhd)\b").expect("screen size pattern")
});
static LEADING_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([^\]]+)\]\s*").expect("leading group pattern"));
static TRAILING_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-([A-Za-z0-9]+)(?:\[[^\]]*\])?$").expect("trailing group pattern")
});
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[._\s]+").expect("separator pattern"));
static QUALITY_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{3,4}[pi]|4k|uhd|hdtv|web[ .-]?dl|webrip|bluray|brrip|dvdrip|x26[45]|h\.?26[45]|hevc|xvid|aac|ac3|dts|proper|repack)\b")
        .expect("quality tag pattern")
});

/// Split `name` into stem and lowercased extension when the suffix looks like a container.
fn split_container(name: &str) -> (&str, Option<String>) {
    let ext = Path::new(name).extension().and_then(|e| e.to_str());
    match ext {
        Some(e) if (2..=4).contains(&e.len()) && e.chars().all(|c| c.is_ascii_alphanumeric()) => {
            (&name[..name.len() - e.len() - 1], Some(e.to_ascii_lowercase()))
        }
        _ => (name, None),
    }
}

/// Turn a raw title fragment into a display title: separators to spaces, trailing
/// dashes and brackets stripped.
fn clean_title(raw: &str) -> Option<String> {
    let spaced = SEPARATORS.replace_all(raw, " ");
    let cleaned = spaced
        .trim()
        .trim_end_matches(|c: char| c == '-' || c == '(' || c == '[' || c.is_whitespace())
        .trim_start_matches(|c: char| c == '-' || c.is_whitespace())
        .to_string();
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

/// Split "Title - Alternative" into its two parts.
fn split_alternative(title: String) -> (String, Option<String>) {
    if let Some((main, alt)) = title.split_once(" - ") {
        let main = main.trim();
        let alt = alt.trim();
        if !main.is_empty() && !alt.is_empty() {
            return (main.to_string(), Some(alt.to_string()));
        }
    }
    (title, None)
}

impl MetadataExtractor for GuessExtractor {
    fn extract(&self, file_name: &str) -> Metadata {
        let mut meta = Metadata::default();
        let (stem, container) = split_container(file_name);
        meta.container = container;

        let mut body = stem.trim();
        if let Some(caps) = LEADING_GROUP.captures(body) {
            meta.release_group = Some(caps[1].trim().to_string());
            body = &body[caps[0].len()..];
        }
        if meta.release_group.is_none()
            && let Some(caps) = TRAILING_GROUP.captures(body)
            && QUALITY_TAGS.is_match(body)
        {
            meta.release_group = Some(caps[1].to_string());
        }

        meta.screen_size = SCREEN_SIZE
            .captures(body)
            .map(|c| c[1].to_ascii_lowercase());

        let marker = EPISODE_MARKERS
            .iter()
            .filter_map(|re| re.captures(body))
            .min_by_key(|c| c.get(0).map(|m| m.start()).unwrap_or(usize::MAX));

        if let Some(caps) = marker {
            let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
            meta.kind = Some(MediaKind::Episode);
            meta.season = caps[1].parse().ok();
            meta.episode = caps[2].parse().ok();
            let head = &body[..start];
            // Years sitting in front of the marker belong to the show name ("Doctor Who 2005").
            if let Some(y) = YEAR.captures(head) {
                meta.year = y[1].parse().ok();
            }
            meta.title = clean_title(head);
        } else if let Some(y) = YEAR.captures_iter(body).last() {
            let m = y.get(1).map(|m| (m.start(), m.as_str()));
            if let Some((start, year)) = m {
                meta.year = year.parse().ok();
                meta.title = clean_title(&body[..start]);
                if meta.title.is_some() {
                    meta.kind = Some(MediaKind::Movie);
                }
            }
        } else {
            let end = QUALITY_TAGS
                .find(body)
                .map(|m| m.start())
                .unwrap_or(body.len());
            meta.title = clean_title(&body[..end]);
        }

        if let Some(title) = meta.title.take() {
            let (title, alt) = split_alternative(title);
            meta.title = Some(title);
            meta.alternative_title = alt;
        }

        trace!(file = file_name, ?meta, "guessed metadata");
        meta
    }
}
