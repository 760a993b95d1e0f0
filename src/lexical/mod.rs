//! Lexical fuzzy matching.
//!
//! Token-set similarity built on normalized Levenshtein distance: each query
//! token is matched against its best counterpart in the candidate's text blob
//! and the per-token scores are averaged onto a 0-100 scale. Tolerant of
//! misspellings and word order, which plain substring search is not.

#[cfg(test)]
mod tests;

use tracing::debug;

use crate::dataset::Record;
use crate::matching::MatchResult;

/// Maximum score on the lexical scale.
pub const MAX_SCORE: f64 = 100.0;

/// Default acceptance cutoff. Scores at or below this are excluded, not
/// merely down-ranked.
pub const DEFAULT_THRESHOLD: f64 = 60.0;

/// Fuzzy string-similarity scorer over candidate text blobs.
#[derive(Debug, Clone)]
pub struct LexicalMatcher {
    threshold: f64,
}

impl Default for LexicalMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl LexicalMatcher {
    /// Creates a matcher with an acceptance threshold on the 0-100 scale.
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, MAX_SCORE),
        }
    }

    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Scores every candidate against `query`, keeping only scores strictly
    /// above the threshold. Results are ordered score descending, ties broken
    /// by candidate title ascending for determinism.
    pub fn score(&self, query: &str, candidates: &[&Record]) -> Vec<MatchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let query_tokens = tokenize(query);
        let mut scored: Vec<(MatchResult, &str)> = candidates
            .iter()
            .filter_map(|record| {
                let score = score_tokens(query, &query_tokens, record.text_blob());
                (score > self.threshold)
                    .then(|| (MatchResult::lexical(record.id(), score), record.title()))
            })
            .collect();

        scored.sort_by(|(a, title_a), (b, title_b)| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| title_a.cmp(title_b))
        });

        debug!(
            query_len = query.len(),
            candidates = candidates.len(),
            matches = scored.len(),
            threshold = self.threshold,
            "Lexical scoring complete"
        );

        scored.into_iter().map(|(result, _)| result).collect()
    }
}

/// Scores one text against a query on the 0-100 scale.
///
/// An exact (case-insensitive) whole-text match short-circuits to the
/// maximum score.
pub fn score_text(query: &str, text: &str) -> f64 {
    score_tokens(query, &tokenize(query), text)
}

fn score_tokens(query: &str, query_tokens: &[String], text: &str) -> f64 {
    if query.eq_ignore_ascii_case(text.trim()) {
        return MAX_SCORE;
    }
    if query_tokens.is_empty() {
        return 0.0;
    }

    let text_tokens = tokenize(text);
    if text_tokens.is_empty() {
        return 0.0;
    }

    let total: f64 = query_tokens
        .iter()
        .map(|qt| {
            text_tokens
                .iter()
                .map(|tt| strsim::normalized_levenshtein(qt, tt))
                .fold(0.0, f64::max)
        })
        .sum();

    (total / query_tokens.len() as f64) * MAX_SCORE
}

/// Lowercased alphanumeric tokens, deduplicated, in first-seen order.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for raw in text.split(|c: char| !c.is_alphanumeric()) {
        if raw.is_empty() {
            continue;
        }
        let token = raw.to_lowercase();
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}
