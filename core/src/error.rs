//! Error types for corpus loading, index building and snapshot handling.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexBuildError {
    #[error("cannot build an index over an empty corpus")]
    EmptyCorpus,
}

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed corpus record in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No corpus files found at {0}")]
    NotFound(PathBuf),

    #[error("Duplicate document id: {0}")]
    DuplicateId(String),

    #[error("Corpus source unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Snapshot encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("Meta file error: {0}")]
    Meta(#[from] serde_json::Error),

    #[error("Unsupported snapshot version: expected {expected}, found {found}")]
    Version { expected: u32, found: u32 },

    #[error("Snapshot built with k1={k1}, b={b}; current constants differ")]
    Parameters { k1: f64, b: f64 },

    #[error("Snapshot index is internally inconsistent: {0}")]
    Inconsistent(String),

    #[error("Snapshot does not match the loaded corpus: {0}")]
    CorpusMismatch(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// A refresh failed; the engine is still serving the previous generation.
    #[error("corpus unavailable, still serving generation {generation}: {source}")]
    CorpusUnavailable {
        generation: u64,
        #[source]
        source: CorpusError,
    },
}
