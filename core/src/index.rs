use crate::config::{BM25_B, BM25_K1};
use crate::corpus::Corpus;
use crate::error::IndexBuildError;
use crate::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Position of a document in corpus order.
pub type DocIdx = u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc: DocIdx,
    pub tf: u32,
}

/// Term statistics for one corpus snapshot. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bm25Index {
    /// term -> postings, sorted by `doc`. The posting count is the document frequency.
    postings: HashMap<String, Vec<Posting>>,
    doc_lengths: Vec<u32>,
    num_docs: u32,
    avgdl: f64,
    k1: f64,
    b: f64,
}

impl Bm25Index {
    /// Build term statistics over `title + " " + abstract` of every document.
    pub fn build(corpus: &Corpus) -> Result<Self, IndexBuildError> {
        if corpus.is_empty() {
            return Err(IndexBuildError::EmptyCorpus);
        }
        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        let mut doc_lengths = Vec::with_capacity(corpus.len());
        let mut total_len: u64 = 0;

        for (pos, doc) in corpus.iter().enumerate() {
            let tokens = tokenize(&doc.indexed_text());
            doc_lengths.push(tokens.len() as u32);
            total_len += tokens.len() as u64;

            let mut tf_counts: HashMap<String, u32> = HashMap::new();
            for tok in tokens {
                *tf_counts.entry(tok).or_insert(0) += 1;
            }
            for (term, tf) in tf_counts {
                postings.entry(term).or_default().push(Posting { doc: pos as DocIdx, tf });
            }
        }

        let num_docs = corpus.len() as u32;
        let avgdl = total_len as f64 / num_docs as f64;
        tracing::info!(num_docs, num_terms = postings.len(), avgdl, "built bm25 index");
        Ok(Self { postings, doc_lengths, num_docs, avgdl, k1: BM25_K1, b: BM25_B })
    }

    pub fn num_docs(&self) -> usize {
        self.num_docs as usize
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }

    pub fn avgdl(&self) -> f64 {
        self.avgdl
    }

    pub fn params(&self) -> (f64, f64) {
        (self.k1, self.b)
    }

    /// Checks the invariants `score` indexes by: one length per document,
    /// postings in bounds and strictly ascending by `doc`, and a finite `avgdl`.
    /// Always holds for a freshly built index; decoded ones must be checked.
    pub fn check_consistency(&self) -> Result<(), String> {
        if self.doc_lengths.len() != self.num_docs as usize {
            return Err(format!("{} document lengths for {} documents", self.doc_lengths.len(), self.num_docs));
        }
        if !self.avgdl.is_finite() || self.avgdl < 0.0 {
            return Err(format!("average document length is {}", self.avgdl));
        }
        for (term, plist) in &self.postings {
            let mut prev: Option<DocIdx> = None;
            for p in plist {
                if p.doc >= self.num_docs {
                    return Err(format!("posting for {term:?} points at document {} of {}", p.doc, self.num_docs));
                }
                if prev.is_some_and(|d| d >= p.doc) {
                    return Err(format!("postings for {term:?} are not sorted by document"));
                }
                prev = Some(p.doc);
            }
        }
        Ok(())
    }

    /// Number of documents containing `term`.
    pub fn doc_freq(&self, term: &str) -> u32 {
        self.postings.get(term).map_or(0, |p| p.len() as u32)
    }

    pub fn term_freq(&self, term: &str, doc: DocIdx) -> u32 {
        self.postings
            .get(term)
            .and_then(|p| p.binary_search_by_key(&doc, |posting| posting.doc).ok().map(|i| p[i].tf))
            .unwrap_or(0)
    }

    pub fn idf(&self, term: &str) -> f64 {
        let n = self.num_docs as f64;
        let df = self.doc_freq(term) as f64;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// BM25 score of every document against `terms`, in corpus order.
    ///
    /// Each occurrence in `terms` contributes once; unknown terms contribute nothing.
    pub fn score<S: AsRef<str>>(&self, terms: &[S]) -> Vec<f64> {
        let mut scores = vec![0.0f64; self.num_docs as usize];
        let (k1, b) = (self.k1, self.b);
        for term in terms {
            let Some(plist) = self.postings.get(term.as_ref()) else { continue };
            let idf = self.idf(term.as_ref());
            for p in plist {
                let tf = p.tf as f64;
                let dl = self.doc_lengths[p.doc as usize] as f64;
                let norm = if self.avgdl > 0.0 { dl / self.avgdl } else { 0.0 };
                scores[p.doc as usize] += idf * (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * norm));
            }
        }
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn corpus(texts: &[&str]) -> Corpus {
        let docs = texts.iter().enumerate().map(|(i, t)| Document::new(format!("d{i}"), *t, "")).collect();
        Corpus::new(docs).unwrap()
    }

    #[test]
    fn empty_corpus_fails() {
        assert!(matches!(Bm25Index::build(&Corpus::empty()), Err(IndexBuildError::EmptyCorpus)));
    }

    #[test]
    fn collects_term_statistics() {
        let idx = Bm25Index::build(&corpus(&["rust rust systems", "rust python", "python scripting"])).unwrap();
        assert_eq!(idx.num_docs(), 3);
        assert_eq!(idx.doc_freq("rust"), 2);
        assert_eq!(idx.term_freq("rust", 0), 2);
        assert_eq!(idx.term_freq("rust", 2), 0);
        assert!((idx.avgdl() - 7.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn score_matches_formula() {
        let idx = Bm25Index::build(&corpus(&["attention model network", "graph neural survey"])).unwrap();
        let scores = idx.score(&["attention"]);
        // N=2, n=1 -> idf = ln(1.5/1.5 + 1) = ln 2; |d| = avgdl so the tf part is 1.
        assert!((scores[0] - 2f64.ln()).abs() < 1e-12);
        assert_eq!(scores[1], 0.0);
    }

    #[test]
    fn unknown_terms_score_zero() {
        let idx = Bm25Index::build(&corpus(&["graph neural networks"])).unwrap();
        assert_eq!(idx.score(&["nonexistent"]), vec![0.0]);
        assert_eq!(idx.score::<&str>(&[]), vec![0.0]);
    }

    #[test]
    fn repeated_query_terms_accumulate() {
        let idx = Bm25Index::build(&corpus(&["graph neural", "other text"])).unwrap();
        let once = idx.score(&["graph"])[0];
        let twice = idx.score(&["graph", "graph"])[0];
        assert!((twice - 2.0 * once).abs() < 1e-12);
    }

    #[test]
    fn built_index_is_consistent() {
        let idx = Bm25Index::build(&corpus(&["graph neural", "graph attention", ""])).unwrap();
        assert_eq!(idx.check_consistency(), Ok(()));
    }

    #[test]
    fn tampered_index_is_inconsistent() {
        let mut idx = Bm25Index::build(&corpus(&["graph neural", "graph attention"])).unwrap();
        idx.postings.get_mut("graph").unwrap().reverse();
        assert!(idx.check_consistency().unwrap_err().contains("not sorted"));

        let mut idx = Bm25Index::build(&corpus(&["graph neural", "graph attention"])).unwrap();
        idx.doc_lengths.pop();
        assert!(idx.check_consistency().is_err());

        let mut idx = Bm25Index::build(&corpus(&["graph neural"])).unwrap();
        idx.postings.insert("ghost".into(), vec![Posting { doc: 5, tf: 1 }]);
        assert!(idx.check_consistency().unwrap_err().contains("ghost"));

        let mut idx = Bm25Index::build(&corpus(&["graph neural"])).unwrap();
        idx.avgdl = f64::NAN;
        assert!(idx.check_consistency().is_err());
    }

    #[test]
    fn document_with_no_tokens_scores_zero() {
        let idx = Bm25Index::build(&corpus(&["", "graph"])).unwrap();
        assert_eq!(idx.score(&["graph"])[0], 0.0);
        assert!(idx.score(&["graph"])[1] > 0.0);
    }
}
