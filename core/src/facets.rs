//! Category and year summaries over a corpus, for filter pickers.

use crate::config::FALLBACK_YEAR_RANGE;
use crate::corpus::Corpus;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetCatalog {
    pub categories: Vec<String>,
    pub year_range: (i32, i32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusStats {
    pub total_papers: usize,
    pub categories: BTreeMap<String, usize>,
    pub year_range: (i32, i32),
}

impl FacetCatalog {
    pub fn from_corpus(corpus: &Corpus) -> Self {
        Self { categories: categories(corpus), year_range: year_range(corpus) }
    }
}

/// Sorted distinct primary categories. Documents without one are skipped.
pub fn categories(corpus: &Corpus) -> Vec<String> {
    corpus
        .iter()
        .filter(|d| !d.primary_category.is_empty())
        .map(|d| d.primary_category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Earliest and latest publication year, or [`FALLBACK_YEAR_RANGE`] when no date parses.
pub fn year_range(corpus: &Corpus) -> (i32, i32) {
    let mut years = corpus.iter().filter_map(|d| d.year());
    let Some(first) = years.next() else { return FALLBACK_YEAR_RANGE };
    years.fold((first, first), |(lo, hi), y| (lo.min(y), hi.max(y)))
}

pub fn stats(corpus: &Corpus) -> CorpusStats {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for doc in corpus.iter().filter(|d| !d.primary_category.is_empty()) {
        *counts.entry(doc.primary_category.clone()).or_insert(0) += 1;
    }
    CorpusStats { total_papers: corpus.len(), categories: counts, year_range: year_range(corpus) }
}
