use crate::{DocId, Document, InvertedIndex};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArtifactError>;

/// Load-time failures. Any of these means the engine must not be built.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("corrupt JSON artifact {path}: {source}")]
    Json { path: PathBuf, source: serde_json::Error },

    #[error("corrupt binary artifact {path}: {source}")]
    Bincode { path: PathBuf, source: bincode::Error },

    #[error("postings for term {term:?} are not strictly increasing")]
    UnsortedPostings { term: String },

    #[error("postings for term {term:?} reference doc_id {doc_id}, corpus has {num_docs} documents")]
    DocIdOutOfRange { term: String, doc_id: DocId, num_docs: usize },

    #[error("doc id map key {0:?} is not an integer doc_id")]
    InvalidDocIdKey(String),

    #[error("doc id map covers {mapped} ids, corpus has {num_docs} documents")]
    DocIdMapDomain { mapped: usize, num_docs: usize },

    #[error("doc id map has no entry for doc_id {0}")]
    MissingDocId(DocId),

    #[error("product id {0:?} is mapped from more than one doc_id")]
    DuplicateProductId(String),

    #[error("doc_id {doc_id} maps to {mapped:?} but the corpus record is {record:?}")]
    ProductIdMismatch { doc_id: DocId, mapped: String, record: String },
}

/// Corpus file names recognized in a data directory, in lookup order.
pub const CORPUS_FILE_NAMES: [&str; 2] = ["corpus.json", "fashion_products_dataset_enriched.json"];

/// Locations of the precomputed artifacts. Files ending in `.bin` are read as
/// bincode, anything else as JSON.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub corpus: PathBuf,
    pub inverted_index: PathBuf,
    pub doc_id_map: PathBuf,
}

impl ArtifactPaths {
    /// Conventional layout under a data directory. The corpus is the first of
    /// [`CORPUS_FILE_NAMES`] present, `corpus.json` when none is.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        let corpus = CORPUS_FILE_NAMES
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file())
            .unwrap_or_else(|| root.join(CORPUS_FILE_NAMES[0]));
        Self {
            corpus,
            inverted_index: root.join("index").join("boolean_inverted_index.json"),
            doc_id_map: root.join("index").join("docid_pid_map.json"),
        }
    }

    /// Read the corpus from an explicit file, keeping the index locations.
    pub fn with_corpus<P: Into<PathBuf>>(mut self, corpus: P) -> Self {
        self.corpus = corpus.into();
        self
    }

    /// Same layout with bincode snapshots instead of JSON.
    pub fn binary<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self {
            corpus: root.join("corpus.bin"),
            inverted_index: root.join("index").join("boolean_inverted_index.bin"),
            doc_id_map: root.join("index").join("docid_pid_map.bin"),
        }
    }
}

/// On-disk shape of the doc-id map: `{"docid_to_pid": {"0": "PID", ...}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocIdMapFile {
    pub docid_to_pid: HashMap<String, String>,
}

impl DocIdMapFile {
    pub fn from_pids(pids: &[String]) -> Self {
        Self { docid_to_pid: pids.iter().enumerate().map(|(i, p)| (i.to_string(), p.clone())).collect() }
    }

    /// Convert to a dense `doc_id -> pid` table, requiring the keys to be
    /// exactly `0..num_docs` and the values to be distinct.
    pub fn into_dense(self, num_docs: usize) -> Result<Vec<String>> {
        if self.docid_to_pid.len() != num_docs {
            return Err(ArtifactError::DocIdMapDomain { mapped: self.docid_to_pid.len(), num_docs });
        }
        let mut dense: Vec<Option<String>> = vec![None; num_docs];
        let mut seen: HashSet<String> = HashSet::with_capacity(num_docs);
        for (key, pid) in self.docid_to_pid {
            let doc_id: usize = key.trim().parse().map_err(|_| ArtifactError::InvalidDocIdKey(key.clone()))?;
            if doc_id >= num_docs {
                return Err(ArtifactError::DocIdMapDomain { mapped: doc_id + 1, num_docs });
            }
            if !seen.insert(pid.clone()) {
                return Err(ArtifactError::DuplicateProductId(pid));
            }
            dense[doc_id] = Some(pid);
        }
        dense
            .into_iter()
            .enumerate()
            .map(|(i, pid)| pid.ok_or(ArtifactError::MissingDocId(i as DocId)))
            .collect()
    }
}

/// The three precomputed inputs, checked for mutual consistency.
#[derive(Debug, Clone, Default)]
pub struct Artifacts {
    pub documents: Vec<Document>,
    pub index: InvertedIndex,
    /// `pids[doc_id]` is the product id of that document.
    pub pids: Vec<String>,
}

impl Artifacts {
    pub fn new(documents: Vec<Document>, index: InvertedIndex, doc_id_map: DocIdMapFile) -> Result<Self> {
        let num_docs = documents.len();
        index.validate(num_docs)?;
        let pids = doc_id_map.into_dense(num_docs)?;
        for (doc_id, (doc, pid)) in documents.iter().zip(&pids).enumerate() {
            if doc.product_id != *pid {
                return Err(ArtifactError::ProductIdMismatch {
                    doc_id: doc_id as DocId,
                    mapped: pid.clone(),
                    record: doc.product_id.clone(),
                });
            }
        }
        Ok(Self { documents, index, pids })
    }

    pub fn num_docs(&self) -> usize { self.documents.len() }
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let f = File::open(path).map_err(|source| ArtifactError::Io { path: path.to_path_buf(), source })?;
    let reader = BufReader::new(f);
    if is_binary(path) {
        bincode::deserialize_from(reader).map_err(|source| ArtifactError::Bincode { path: path.to_path_buf(), source })
    } else {
        serde_json::from_reader(reader).map_err(|source| ArtifactError::Json { path: path.to_path_buf(), source })
    }
}

fn write_artifact<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let io_err = |source| ArtifactError::Io { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent() {
        create_dir_all(parent).map_err(io_err)?;
    }
    let mut w = BufWriter::new(File::create(path).map_err(io_err)?);
    if is_binary(path) {
        bincode::serialize_into(&mut w, value).map_err(|source| ArtifactError::Bincode { path: path.to_path_buf(), source })?;
    } else {
        serde_json::to_writer(&mut w, value).map_err(|source| ArtifactError::Json { path: path.to_path_buf(), source })?;
    }
    w.flush().map_err(io_err)
}

fn is_binary(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("bin")
}

pub fn load_corpus(path: &Path) -> Result<Vec<Document>> {
    read_artifact(path)
}

pub fn load_inverted_index(path: &Path) -> Result<InvertedIndex> {
    read_artifact(path)
}

pub fn load_doc_id_map(path: &Path) -> Result<DocIdMapFile> {
    read_artifact(path)
}

/// Load and cross-check all artifacts.
pub fn load_artifacts(paths: &ArtifactPaths) -> Result<Artifacts> {
    let documents = load_corpus(&paths.corpus)?;
    let index = load_inverted_index(&paths.inverted_index)?;
    let doc_id_map = load_doc_id_map(&paths.doc_id_map)?;
    tracing::info!(num_docs = documents.len(), num_terms = index.num_terms(), "loaded artifacts");
    Artifacts::new(documents, index, doc_id_map)
}

/// Write artifacts back out in the format implied by each path's extension.
pub fn save_artifacts(paths: &ArtifactPaths, artifacts: &Artifacts) -> Result<()> {
    write_artifact(&paths.corpus, &artifacts.documents)?;
    write_artifact(&paths.inverted_index, &artifacts.index)?;
    write_artifact(&paths.doc_id_map, &DocIdMapFile::from_pids(&artifacts.pids))?;
    Ok(())
}
