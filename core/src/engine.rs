//! Query-time orchestration: expansion, tokenization, BM25 ranking, facet
//! filtering, date sorting and truncation.
//!
//! The engine publishes an immutable [`EngineState`] behind a
//! `RwLock<Arc<_>>`. Readers hold the lock only long enough to clone the
//! `Arc`; a refresh builds a complete new state without the lock and swaps it
//! in with one write. That swap is the only synchronization in the engine.

use crate::config::SearchConfig;
use crate::corpus::{Corpus, CorpusSource};
use crate::document::Document;
use crate::error::{CorpusError, EngineError};
use crate::expansion::expand;
use crate::facets::{self, CorpusStats, FacetCatalog};
use crate::index::Bm25Index;
use crate::tokenizer::{tokenize, tokenize_unique};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    Relevance,
    DateDesc,
    DateAsc,
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "relevance" => Ok(SortMode::Relevance),
            "date_desc" => Ok(SortMode::DateDesc),
            "date_asc" => Ok(SortMode::DateAsc),
            other => Err(format!("unknown sort mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub category: Option<String>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub author: Option<String>,
    pub sort: SortMode,
    pub semantic: bool,
    pub limit: usize,
}

impl SearchQuery {
    pub const DEFAULT_LIMIT: usize = 10;

    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: None,
            year_min: None,
            year_max: None,
            author: None,
            sort: SortMode::Relevance,
            semantic: false,
            limit: Self::DEFAULT_LIMIT,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn years(mut self, min: Option<i32>, max: Option<i32>) -> Self {
        self.year_min = min;
        self.year_max = max;
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }

    pub fn semantic(mut self, semantic: bool) -> Self {
        self.semantic = semantic;
        self
    }

    /// Terms the index is queried with.
    pub fn terms(&self) -> Vec<String> {
        if self.semantic {
            tokenize_unique(expand(&self.text))
        } else {
            tokenize(&self.text)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub document: Document,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
    /// Number of results on this page.
    pub count: usize,
    /// Candidates that passed the filters before truncation to `limit`.
    pub total_hits: usize,
    pub effective_query_terms: Vec<String>,
}

impl SearchResponse {
    fn empty(query: &SearchQuery, terms: Vec<String>) -> Self {
        Self { query: query.text.clone(), results: Vec::new(), count: 0, total_hits: 0, effective_query_terms: terms }
    }
}

/// One published generation of corpus, index and facets.
#[derive(Debug)]
pub struct EngineState {
    pub generation: u64,
    pub corpus: Corpus,
    /// `None` when the corpus is empty; searches then return no results.
    pub index: Option<Bm25Index>,
    pub facets: FacetCatalog,
}

impl EngineState {
    fn build(generation: u64, corpus: Corpus, index: Option<Bm25Index>) -> Self {
        let index = index.or_else(|| match Bm25Index::build(&corpus) {
            Ok(index) => Some(index),
            Err(err) => {
                tracing::warn!(error = %err, "serving without an index");
                None
            }
        });
        let facets = FacetCatalog::from_corpus(&corpus);
        Self { generation, corpus, index, facets }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub generation: u64,
    pub num_docs: usize,
    pub num_terms: usize,
    pub indexed: bool,
}

pub struct RetrievalEngine {
    state: RwLock<Arc<EngineState>>,
    config: SearchConfig,
}

impl RetrievalEngine {
    /// Builds the index for `corpus`. An empty corpus yields an engine with no index.
    pub fn new(corpus: Corpus, config: SearchConfig) -> Self {
        Self::with_index(corpus, None, config)
    }

    /// Uses a prebuilt index when given one (it must already be validated
    /// against `corpus`), otherwise builds it.
    pub fn with_index(corpus: Corpus, index: Option<Bm25Index>, config: SearchConfig) -> Self {
        let state = EngineState::build(1, corpus, index);
        Self { state: RwLock::new(Arc::new(state)), config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The currently published state. Holding it pins that generation.
    pub fn state(&self) -> Arc<EngineState> {
        self.state.read().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.state().index.is_some()
    }

    pub fn document(&self, id: &str) -> Option<Document> {
        self.state().corpus.get(id).cloned()
    }

    pub fn facets(&self) -> FacetCatalog {
        self.state().facets.clone()
    }

    pub fn stats(&self) -> CorpusStats {
        facets::stats(&self.state().corpus)
    }

    /// Replaces the corpus, rebuilding the index and publishing the result as one unit.
    pub fn replace(&self, corpus: Corpus) -> RefreshReport {
        // The build runs without the lock; only the pointer swap is serialized.
        let mut next = EngineState::build(0, corpus, None);
        let report = {
            let mut guard = self.state.write();
            next.generation = guard.generation + 1;
            let report = RefreshReport {
                generation: next.generation,
                num_docs: next.corpus.len(),
                num_terms: next.index.as_ref().map_or(0, Bm25Index::num_terms),
                indexed: next.index.is_some(),
            };
            *guard = Arc::new(next);
            report
        };
        tracing::info!(generation = report.generation, num_docs = report.num_docs, num_terms = report.num_terms, "published index generation");
        report
    }

    /// Reloads from `source`. On failure the previous generation keeps serving.
    pub fn refresh(&self, source: &dyn CorpusSource) -> Result<RefreshReport, EngineError> {
        let unavailable = |err: CorpusError| EngineError::CorpusUnavailable { generation: self.state().generation, source: err };
        let docs = source.load().map_err(unavailable)?;
        let corpus = Corpus::new(docs).map_err(unavailable)?;
        Ok(self.replace(corpus))
    }

    pub fn search(&self, query: &SearchQuery) -> SearchResponse {
        let state = self.state();
        let terms = query.terms();
        let Some(index) = state.index.as_ref() else {
            return SearchResponse::empty(query, terms);
        };
        let docs = state.corpus.documents();
        let limit = query.limit.min(self.config.max_limit);

        // No usable terms: every document ties at zero, which turns the rest of
        // the pipeline into a filtered browse in corpus order.
        let scores = if terms.is_empty() { vec![0.0; docs.len()] } else { index.score(&terms) };
        let mut ranked: Vec<(usize, f64)> = scores.into_iter().enumerate().collect();
        // Stable, so equal scores keep corpus order.
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked.truncate(self.config.candidate_window(limit));

        let category = non_blank(query.category.as_deref());
        let author = non_blank(query.author.as_deref()).map(str::to_lowercase);
        let mut hits: Vec<(usize, f64)> = ranked
            .into_iter()
            .filter(|&(pos, _)| {
                let doc = &docs[pos];
                category.map_or(true, |c| doc.primary_category == c)
                    && within_years(doc, query.year_min, query.year_max)
                    && author.as_deref().map_or(true, |a| doc.authors.to_lowercase().contains(a))
            })
            .collect();

        match query.sort {
            SortMode::Relevance => {}
            SortMode::DateDesc => hits.sort_by(|a, b| docs[b.0].published.cmp(&docs[a.0].published)),
            SortMode::DateAsc => hits.sort_by(|a, b| docs[a.0].published.cmp(&docs[b.0].published)),
        }

        let total_hits = hits.len();
        let results: Vec<SearchHit> = hits
            .into_iter()
            .take(limit)
            .map(|(pos, score)| SearchHit { document: docs[pos].clone(), score })
            .collect();
        tracing::debug!(query = %query.text, terms = terms.len(), total_hits, returned = results.len(), "search");
        SearchResponse { query: query.text.clone(), count: results.len(), total_hits, results, effective_query_terms: terms }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A document without a parseable year is excluded whenever a bound is set.
fn within_years(doc: &Document, min: Option<i32>, max: Option<i32>) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }
    let Some(year) = doc.year() else { return false };
    min.map_or(true, |m| year >= m) && max.map_or(true, |m| year <= m)
}
