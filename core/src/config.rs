//! Ranking constants and engine tuning.
//!
//! The BM25 constants are baked into every persisted snapshot; a snapshot
//! built with different values is rejected on load and rebuilt.

/// BM25 term frequency saturation.
pub const BM25_K1: f64 = 1.5;

/// BM25 document length normalization.
pub const BM25_B: f64 = 0.75;

/// Default multiplier applied to `limit` when choosing how many ranked
/// candidates survive into the filter stage.
pub const DEFAULT_OVERFETCH_FACTOR: usize = 10;

/// Smallest overfetch factor the engine will run with.
pub const MIN_OVERFETCH_FACTOR: usize = 2;

/// Largest page size a single search may request.
pub const DEFAULT_MAX_LIMIT: usize = 100;

/// Year range reported when no document carries a parseable date.
pub const FALLBACK_YEAR_RANGE: (i32, i32) = (2000, 2024);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    pub overfetch_factor: usize,
    pub max_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { overfetch_factor: DEFAULT_OVERFETCH_FACTOR, max_limit: DEFAULT_MAX_LIMIT }
    }
}

impl SearchConfig {
    pub fn with_overfetch_factor(mut self, factor: usize) -> Self {
        self.overfetch_factor = factor.max(MIN_OVERFETCH_FACTOR);
        self
    }

    pub fn with_max_limit(mut self, max_limit: usize) -> Self {
        self.max_limit = max_limit.max(1);
        self
    }

    /// Number of ranked candidates kept ahead of filtering for a page of `limit`.
    pub fn candidate_window(&self, limit: usize) -> usize {
        limit.saturating_mul(self.overfetch_factor.max(MIN_OVERFETCH_FACTOR))
    }
}
