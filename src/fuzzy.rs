//! Fuzzy name matching.
//!
//! Similarity is the normalized Levenshtein ratio of the two names after trimming and
//! lowercasing: identical names score 1.0, names sharing nothing score 0.0.
//!
//! `best_match` returns the highest-scoring candidate at or above a cutoff. Ties go
//! to the candidate that appears first, so results are deterministic for a fixed
//! candidate order.

use strsim::normalized_levenshtein;
use tracing::debug;

/// Similarity ratio in `[0.0, 1.0]`.
pub fn ratio(a: &str, b: &str) -> f64 {
    normalized_levenshtein(&normalize(a), &normalize(b))
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// A candidate chosen by [`best_match`].
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'a> {
    pub candidate: &'a str,
    pub score: f64,
}

/// Pick the best candidate for `query` scoring at least `cutoff`.
pub fn best_match<'a, I>(query: &str, candidates: I, cutoff: f64) -> Option<Match<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<Match<'a>> = None;
    for candidate in candidates {
        let score = ratio(query, candidate);
        if score < cutoff {
            continue;
        }
        match &best {
            Some(current) if current.score >= score => {}
            _ => best = Some(Match { candidate, score }),
        }
    }
    match &best {
        Some(m) => debug!(query, candidate = m.candidate, score = m.score, cutoff, "fuzzy match"),
        None => debug!(query, cutoff, "fuzzy match: no candidate above cutoff"),
    }
    best
}
