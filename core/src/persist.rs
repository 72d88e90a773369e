//! Versioned on-disk index snapshots.
//!
//! A snapshot directory holds `snapshot.bin` (bincode: version, document ids in
//! corpus order, term statistics) and a human-readable `meta.json`. A snapshot
//! is only trusted after [`Snapshot::validate`] against the live corpus.

use crate::config::{BM25_B, BM25_K1};
use crate::corpus::Corpus;
use crate::error::SnapshotError;
use crate::index::Bm25Index;
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn snapshot(&self) -> PathBuf { self.root.join("snapshot.bin") }
    fn snapshot_tmp(&self) -> PathBuf { self.root.join("snapshot.bin.tmp") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }

    pub fn exists(&self) -> bool {
        self.snapshot().is_file()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub doc_ids: Vec<String>,
    pub index: Bm25Index,
}

impl Snapshot {
    pub fn new(corpus: &Corpus, index: Bm25Index) -> Self {
        Self { version: SNAPSHOT_VERSION, doc_ids: corpus.ids(), index }
    }

    /// Checks that this snapshot was built from `corpus` with the current constants.
    pub fn validate(&self, corpus: &Corpus) -> Result<(), SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version { expected: SNAPSHOT_VERSION, found: self.version });
        }
        let (k1, b) = self.index.params();
        if k1 != BM25_K1 || b != BM25_B {
            return Err(SnapshotError::Parameters { k1, b });
        }
        self.index.check_consistency().map_err(SnapshotError::Inconsistent)?;
        if self.index.num_docs() != self.doc_ids.len() {
            return Err(SnapshotError::CorpusMismatch(format!(
                "index covers {} documents but lists {} ids",
                self.index.num_docs(),
                self.doc_ids.len()
            )));
        }
        if self.doc_ids.len() != corpus.len() {
            return Err(SnapshotError::CorpusMismatch(format!(
                "snapshot has {} documents, corpus has {}",
                self.doc_ids.len(),
                corpus.len()
            )));
        }
        if let Some((pos, (ours, theirs))) =
            self.doc_ids.iter().zip(corpus.iter().map(|d| &d.id)).enumerate().find(|(_, (a, b))| a != b)
        {
            return Err(SnapshotError::CorpusMismatch(format!(
                "document {pos} is {ours:?} in the snapshot but {theirs:?} in the corpus"
            )));
        }
        Ok(())
    }

    /// Consumes the snapshot, yielding the index if it is valid for `corpus`.
    pub fn into_index(self, corpus: &Corpus) -> Result<Bm25Index, SnapshotError> {
        self.validate(corpus)?;
        Ok(self.index)
    }
}

/// Borrowed view with the same encoding as [`Snapshot`].
#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    doc_ids: &'a [String],
    index: &'a Bm25Index,
}

/// Writes the snapshot through a temp file and rename so readers never see a partial file.
pub fn save_snapshot(paths: &IndexPaths, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    let view = SnapshotRef { version: snapshot.version, doc_ids: &snapshot.doc_ids, index: &snapshot.index };
    write_snapshot(paths, &view)
}

fn write_snapshot(paths: &IndexPaths, view: &SnapshotRef<'_>) -> Result<(), SnapshotError> {
    create_dir_all(&paths.root)?;
    let bytes = bincode::serialize(view)?;
    let mut f = File::create(paths.snapshot_tmp())?;
    f.write_all(&bytes)?;
    f.sync_all()?;
    fs::rename(paths.snapshot_tmp(), paths.snapshot())?;
    tracing::info!(root = %paths.root.display(), bytes = bytes.len(), "saved index snapshot");
    Ok(())
}

/// Persists `index` for `corpus` together with its meta file.
pub fn write_index(paths: &IndexPaths, corpus: &Corpus, index: &Bm25Index, created_at: String) -> Result<MetaFile, SnapshotError> {
    let doc_ids = corpus.ids();
    write_snapshot(paths, &SnapshotRef { version: SNAPSHOT_VERSION, doc_ids: &doc_ids, index })?;
    let meta = MetaFile {
        num_docs: corpus.len() as u32,
        num_terms: index.num_terms() as u32,
        created_at,
        version: SNAPSHOT_VERSION,
    };
    save_meta(paths, &meta)?;
    Ok(meta)
}

pub fn load_snapshot(paths: &IndexPaths) -> Result<Snapshot, SnapshotError> {
    let mut f = File::open(paths.snapshot())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let snapshot = bincode::deserialize(&buf)?;
    Ok(snapshot)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<(), SnapshotError> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile, SnapshotError> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Loads a snapshot and validates it, returning `None` (with a warning) when it
/// is absent, unreadable or stale.
pub fn load_valid_index(paths: &IndexPaths, corpus: &Corpus) -> Option<Bm25Index> {
    if !paths.exists() {
        tracing::info!(root = %paths.root.display(), "no index snapshot found");
        return None;
    }
    match load_snapshot(paths).and_then(|s| s.into_index(corpus)) {
        Ok(index) => Some(index),
        Err(err) => {
            tracing::warn!(root = %paths.root.display(), error = %err, "discarding index snapshot");
            None
        }
    }
}
