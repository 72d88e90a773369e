pub mod config;
pub mod corpus;
pub mod document;
pub mod engine;
pub mod error;
pub mod expansion;
pub mod facets;
pub mod index;
pub mod persist;
pub mod tokenizer;

pub use config::SearchConfig;
pub use corpus::{Corpus, CorpusSource, JsonCorpus};
pub use document::Document;
pub use engine::{EngineState, RefreshReport, RetrievalEngine, SearchHit, SearchQuery, SearchResponse, SortMode};
pub use error::{CorpusError, EngineError, IndexBuildError, SnapshotError};
pub use facets::{CorpusStats, FacetCatalog};
pub use index::{Bm25Index, DocIdx, Posting};
