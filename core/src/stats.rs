//! Corpus-wide term statistics, computed once when the engine is built.

use crate::{DocId, Document, InvertedIndex, TextField, Tokenizer};
use std::collections::{BTreeMap, HashMap};

/// Everything the scorers need, derived from the documents and index.
///
/// Immutable after [`CorpusStatistics::build`]; safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct CorpusStatistics {
    pub num_docs: usize,
    pub term_df: HashMap<String, usize>,
    /// Raw term counts per document, indexed by doc_id.
    pub doc_tf: Vec<HashMap<String, u32>>,
    pub doc_len: Vec<u32>,
    pub avg_doc_len: f64,
    pub idf_tfidf: HashMap<String, f64>,
    pub idf_bm25: HashMap<String, f64>,
    /// Non-zero TF-IDF weights per document, indexed by doc_id.
    pub tfidf_weights: Vec<HashMap<String, f64>>,
    pub doc_norm: Vec<f64>,
}

/// Log-scaled term frequency shared by documents and queries.
#[inline]
pub fn log_tf(tf: u32) -> f64 {
    1.0 + (tf as f64).log2()
}

pub fn idf_tfidf(num_docs: usize, df: usize) -> f64 {
    if df > 0 { (num_docs as f64 / df as f64).log2() } else { 0.0 }
}

pub fn idf_bm25(num_docs: usize, df: usize) -> f64 {
    let (n, df) = (num_docs as f64, df as f64);
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

impl CorpusStatistics {
    /// Build statistics for `documents`, concatenating `fields` in order before
    /// tokenizing. Document frequencies come from the index postings.
    pub fn build(documents: &[Document], fields: &[TextField], index: &InvertedIndex, tokenizer: &dyn Tokenizer) -> Self {
        let num_docs = documents.len();

        let term_df: HashMap<String, usize> = index.terms().map(|(t, plist)| (t.to_string(), plist.len())).collect();
        let idf_tfidf: HashMap<String, f64> = term_df.iter().map(|(t, &df)| (t.clone(), idf_tfidf(num_docs, df))).collect();
        let idf_bm25: HashMap<String, f64> = term_df.iter().map(|(t, &df)| (t.clone(), idf_bm25(num_docs, df))).collect();

        let mut doc_tf = Vec::with_capacity(num_docs);
        let mut doc_len = Vec::with_capacity(num_docs);
        let mut tfidf_weights = Vec::with_capacity(num_docs);
        let mut doc_norm = Vec::with_capacity(num_docs);

        for doc in documents {
            let mut tf: BTreeMap<String, u32> = BTreeMap::new();
            for field in fields {
                if let Some(text) = doc.indexed_text(*field) {
                    for term in tokenizer.tokenize(text) {
                        *tf.entry(term).or_insert(0) += 1;
                    }
                }
            }
            let len: u32 = tf.values().sum();

            let mut weights = HashMap::new();
            let mut sq = 0.0;
            for (term, &f) in &tf {
                if f == 0 {
                    continue;
                }
                let w = log_tf(f) * idf_tfidf.get(term).copied().unwrap_or(0.0);
                if w != 0.0 {
                    weights.insert(term.clone(), w);
                    sq += w * w;
                }
            }

            doc_norm.push(if sq > 0.0 { sq.sqrt() } else { 0.0 });
            tfidf_weights.push(weights);
            doc_len.push(len);
            doc_tf.push(tf.into_iter().collect());
        }

        let total_len: f64 = doc_len.iter().map(|&l| l as f64).sum();
        let avg_doc_len = total_len / num_docs.max(1) as f64;

        tracing::info!(num_docs, num_terms = term_df.len(), avg_doc_len, "built corpus statistics");

        Self { num_docs, term_df, doc_tf, doc_len, avg_doc_len, idf_tfidf, idf_bm25, tfidf_weights, doc_norm }
    }

    pub fn tf(&self, doc_id: DocId, term: &str) -> u32 {
        self.doc_tf.get(doc_id as usize).and_then(|m| m.get(term)).copied().unwrap_or(0)
    }

    pub fn doc_len(&self, doc_id: DocId) -> u32 {
        self.doc_len.get(doc_id as usize).copied().unwrap_or(0)
    }

    pub fn doc_norm(&self, doc_id: DocId) -> f64 {
        self.doc_norm.get(doc_id as usize).copied().unwrap_or(0.0)
    }

    pub fn tfidf_weight(&self, doc_id: DocId, term: &str) -> f64 {
        self.tfidf_weights.get(doc_id as usize).and_then(|m| m.get(term)).copied().unwrap_or(0.0)
    }

    pub fn idf_tfidf(&self, term: &str) -> f64 {
        self.idf_tfidf.get(term).copied().unwrap_or(0.0)
    }

    pub fn idf_bm25(&self, term: &str) -> f64 {
        self.idf_bm25.get(term).copied().unwrap_or(0.0)
    }
}
