//! Shared match types produced by the lexical and semantic matchers.

/// Which strategy produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Fuzzy string similarity, scored 0-100.
    Lexical,
    /// Embedding cosine similarity, scored [-1, 1].
    Semantic,
}

/// A scored candidate, transient within one retrieval call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    pub record_id: u64,
    /// Raw score on the producing strategy's own scale.
    pub score: f64,
    pub kind: MatchKind,
}

impl MatchResult {
    #[inline]
    pub fn lexical(record_id: u64, score: f64) -> Self {
        Self {
            record_id,
            score,
            kind: MatchKind::Lexical,
        }
    }

    #[inline]
    pub fn semantic(record_id: u64, score: f64) -> Self {
        Self {
            record_id,
            score,
            kind: MatchKind::Semantic,
        }
    }

    /// Score normalized to [0, 1] for cross-strategy comparison: lexical is
    /// divided by its 100-point scale, semantic cosine is clamped at zero.
    pub fn normalized_score(&self) -> f64 {
        match self.kind {
            MatchKind::Lexical => (self.score / 100.0).clamp(0.0, 1.0),
            MatchKind::Semantic => self.score.clamp(0.0, 1.0),
        }
    }
}
