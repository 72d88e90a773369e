//! The document collection and where it comes from.

use crate::document::Document;
use crate::error::CorpusError;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Ordered, immutable set of documents addressable by id.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    docs: Vec<Document>,
    by_id: HashMap<String, usize>,
}

impl Corpus {
    /// Builds a corpus, rejecting duplicated ids. Records without an id are
    /// skipped since nothing can address them.
    pub fn new(docs: Vec<Document>) -> Result<Self, CorpusError> {
        let total = docs.len();
        let docs: Vec<Document> = docs.into_iter().filter(|d| !d.id.trim().is_empty()).collect();
        if docs.len() < total {
            tracing::warn!(skipped = total - docs.len(), "skipping documents without an id");
        }
        let mut by_id = HashMap::with_capacity(docs.len());
        for (pos, doc) in docs.iter().enumerate() {
            if by_id.insert(doc.id.clone(), pos).is_some() {
                return Err(CorpusError::DuplicateId(doc.id.clone()));
            }
        }
        Ok(Self { docs, by_id })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.by_id.get(id).map(|&pos| &self.docs[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> + '_ {
        self.docs.iter()
    }

    /// Document ids in corpus order.
    pub fn ids(&self) -> Vec<String> {
        self.docs.iter().map(|d| d.id.clone()).collect()
    }
}

/// Supplies the full document set at startup and on every refresh.
pub trait CorpusSource: Send + Sync {
    fn load(&self) -> Result<Vec<Document>, CorpusError>;

    fn describe(&self) -> String {
        "corpus".to_string()
    }
}

impl CorpusSource for Vec<Document> {
    fn load(&self) -> Result<Vec<Document>, CorpusError> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory corpus ({} documents)", self.len())
    }
}

/// Reads documents from a `.json` file (array or single object), a `.jsonl`
/// file, or a directory containing such files.
#[derive(Debug, Clone)]
pub struct JsonCorpus {
    root: PathBuf,
}

impl JsonCorpus {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn files(&self) -> Result<Vec<PathBuf>, CorpusError> {
        if self.root.is_file() {
            return Ok(vec![self.root.clone()]);
        }
        if !self.root.is_dir() {
            return Err(CorpusError::NotFound(self.root.clone()));
        }
        let mut files: Vec<PathBuf> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| p.is_file() && matches!(extension(p), Some("json" | "jsonl")))
            .collect();
        // Corpus order has to be reproducible across reloads.
        files.sort();
        if files.is_empty() {
            return Err(CorpusError::NotFound(self.root.clone()));
        }
        Ok(files)
    }
}

impl CorpusSource for JsonCorpus {
    fn load(&self) -> Result<Vec<Document>, CorpusError> {
        let mut docs = Vec::new();
        for file in self.files()? {
            if extension(&file) == Some("jsonl") {
                read_jsonl(&file, &mut docs)?;
            } else {
                read_json(&file, &mut docs)?;
            }
        }
        tracing::debug!(root = %self.root.display(), num_docs = docs.len(), "loaded corpus files");
        Ok(docs)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|s| s.to_str())
}

fn open(path: &Path) -> Result<BufReader<File>, CorpusError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| CorpusError::Io { path: path.to_path_buf(), source })
}

fn read_jsonl(path: &Path, docs: &mut Vec<Document>) -> Result<(), CorpusError> {
    for line in open(path)?.lines() {
        let line = line.map_err(|source| CorpusError::Io { path: path.to_path_buf(), source })?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: Document = serde_json::from_str(&line)
            .map_err(|source| CorpusError::Parse { path: path.to_path_buf(), source })?;
        docs.push(doc);
    }
    Ok(())
}

fn read_json(path: &Path, docs: &mut Vec<Document>) -> Result<(), CorpusError> {
    let parse_err = |source: serde_json::Error| CorpusError::Parse { path: path.to_path_buf(), source };
    let json: serde_json::Value = serde_json::from_reader(open(path)?).map_err(parse_err)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                docs.push(serde_json::from_value(v).map_err(parse_err)?);
            }
        }
        obj @ serde_json::Value::Object(_) => docs.push(serde_json::from_value(obj).map_err(parse_err)?),
        _ => {}
    }
    Ok(())
}
