//! Retrieval and ranking over a preloaded product catalog: boolean candidate
//! selection on an inverted index, then cosine TF-IDF, BM25 or a
//! business-boosted hybrid.

pub mod document;
pub mod engine;
pub mod index;
pub mod persist;
pub mod scoring;
pub mod stats;
pub mod tokenizer;

pub use document::{corpus_by_pid, details_url, CorpusLookup, DocId, Document, ResultItem, TextField, INDEXED_TEXT_FIELDS};
pub use engine::{RankingEngine, Retrieval, SearchOptions, DEFAULT_K};
pub use index::{intersect_sorted, InvertedIndex};
pub use persist::{ArtifactError, ArtifactPaths, Artifacts, DocIdMapFile, CORPUS_FILE_NAMES};
pub use scoring::{numeric_boost, value_score, ScoringMethod};
pub use stats::CorpusStatistics;
pub use tokenizer::{TextNormalizer, Tokenizer, WhitespaceTokenizer};
