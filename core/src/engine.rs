use crate::persist::{self, ArtifactPaths, Artifacts};
use crate::{
    CorpusLookup, CorpusStatistics, DocId, Document, InvertedIndex, ResultItem, ScoringMethod, TextNormalizer, Tokenizer,
    WhitespaceTokenizer, INDEXED_TEXT_FIELDS,
};
use std::cmp::Ordering;

pub const DEFAULT_K: usize = 20;

/// Per-call knobs for [`RankingEngine::search_with`].
///
/// `k == 0` yields no results. `use_and` tries conjunctive retrieval first
/// and falls back to disjunctive retrieval when nothing matches every term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub method: ScoringMethod,
    pub k: usize,
    pub use_and: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { method: ScoringMethod::Bm25, k: DEFAULT_K, use_and: true }
    }
}

/// How the candidate set for a query was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retrieval {
    And,
    /// AND matched nothing, fell back to OR.
    OrFallback,
    Or,
}

/// Retrieval and ranking over a fixed, preloaded catalog.
///
/// All state is built in the constructor and never mutated afterwards, so a
/// single engine can serve concurrent queries through a shared reference.
pub struct RankingEngine {
    documents: Vec<Document>,
    index: InvertedIndex,
    pids: Vec<String>,
    stats: CorpusStatistics,
    query_tokenizer: Box<dyn Tokenizer>,
}

impl RankingEngine {
    /// Build with the default tokenizers: whitespace splitting for the
    /// pre-normalized catalog fields, [`TextNormalizer`] for queries.
    pub fn from_artifacts(artifacts: Artifacts) -> Self {
        Self::new(artifacts, &WhitespaceTokenizer, Box::new(TextNormalizer))
    }

    pub fn new(artifacts: Artifacts, document_tokenizer: &dyn Tokenizer, query_tokenizer: Box<dyn Tokenizer>) -> Self {
        let Artifacts { documents, index, pids } = artifacts;
        let stats = CorpusStatistics::build(&documents, &INDEXED_TEXT_FIELDS, &index, document_tokenizer);
        tracing::info!(num_docs = documents.len(), num_terms = index.num_terms(), "ranking engine ready");
        Self { documents, index, pids, stats, query_tokenizer }
    }

    /// Load artifacts from disk and build the engine. Fails on any missing,
    /// corrupt or inconsistent artifact.
    pub fn load(paths: &ArtifactPaths) -> persist::Result<Self> {
        let artifacts = persist::load_artifacts(paths)?;
        Ok(Self::from_artifacts(artifacts))
    }

    pub fn documents(&self) -> &[Document] { &self.documents }

    pub fn stats(&self) -> &CorpusStatistics { &self.stats }

    pub fn index(&self) -> &InvertedIndex { &self.index }

    pub fn num_docs(&self) -> usize { self.documents.len() }

    pub fn product_id(&self, doc_id: DocId) -> Option<&str> {
        self.pids.get(doc_id as usize).map(String::as_str)
    }

    pub fn tokenize_query(&self, query: &str) -> Vec<String> {
        self.query_tokenizer.tokenize(query)
    }

    /// Candidate doc_ids for already-tokenized terms, in ascending order.
    pub fn candidates<S: AsRef<str>>(&self, terms: &[S], use_and: bool) -> (Vec<DocId>, Retrieval) {
        if !use_and {
            return (self.index.candidates_or(terms), Retrieval::Or);
        }
        let and = self.index.candidates_and(terms);
        if !and.is_empty() {
            return (and, Retrieval::And);
        }
        (self.index.candidates_or(terms), Retrieval::OrFallback)
    }

    /// Score and order candidates without materializing results: score
    /// descending, ties by ascending doc_id, at most `k` entries.
    pub fn rank<S: AsRef<str>>(&self, terms: &[S], options: &SearchOptions) -> Vec<(DocId, f64)> {
        if options.k == 0 || terms.is_empty() {
            return Vec::new();
        }
        let (candidates, retrieval) = self.candidates(terms, options.use_and);
        tracing::debug!(?retrieval, candidates = candidates.len(), method = %options.method, "retrieved candidates");
        if candidates.is_empty() {
            return Vec::new();
        }

        let scores = options.method.score(&self.stats, &self.documents, terms, &candidates);
        let mut ranked: Vec<(DocId, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(options.k);
        ranked
    }

    /// Rank `query_text` and materialize the top `k` hits. Hits whose product
    /// id is missing from `corpus` are dropped.
    pub fn search(
        &self,
        query_text: &str,
        search_id: &str,
        corpus: &impl CorpusLookup,
        method: ScoringMethod,
        k: usize,
        use_and: bool,
    ) -> Vec<ResultItem> {
        self.search_with(query_text, search_id, corpus, &SearchOptions { method, k, use_and })
    }

    pub fn search_with(&self, query_text: &str, search_id: &str, corpus: &impl CorpusLookup, options: &SearchOptions) -> Vec<ResultItem> {
        let terms = self.tokenize_query(query_text);
        if terms.is_empty() {
            tracing::debug!(query = query_text, "query has no searchable terms");
            return Vec::new();
        }
        self.rank(&terms, options)
            .into_iter()
            .filter_map(|(doc_id, score)| {
                let pid = self.product_id(doc_id)?;
                let doc = corpus.lookup(pid)?;
                Some(ResultItem::from_document(doc, score, search_id))
            })
            .collect()
    }
}
