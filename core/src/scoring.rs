use crate::stats::log_tf;
use crate::{CorpusStatistics, DocId, Document};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

pub const BM25_K1: f64 = 1.5;
pub const BM25_B: f64 = 0.75;

const PRICE_CAP: f64 = 4000.0;
const RATING_SCALE: f64 = 5.0;
const DISCOUNT_SCALE: f64 = 80.0;
const OUT_OF_STOCK_FACTOR: f64 = 0.2;

pub type Scores = HashMap<DocId, f64>;

/// Ranking model selected per query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMethod {
    /// Cosine similarity over log-scaled TF-IDF vectors.
    TfIdf,
    #[default]
    Bm25,
    /// Cosine TF-IDF multiplied by the catalog [`numeric_boost`].
    Custom,
}

impl ScoringMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringMethod::TfIdf => "tfidf",
            ScoringMethod::Bm25 => "bm25",
            ScoringMethod::Custom => "custom",
        }
    }

    /// Lenient parse: unrecognized names select BM25.
    pub fn parse_or_default(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "tfidf" => ScoringMethod::TfIdf,
            "custom" => ScoringMethod::Custom,
            _ => ScoringMethod::Bm25,
        }
    }

    pub fn score<S: AsRef<str>>(&self, stats: &CorpusStatistics, documents: &[Document], query_terms: &[S], candidates: &[DocId]) -> Scores {
        match self {
            ScoringMethod::TfIdf => tfidf_cosine_scores(stats, query_terms, candidates),
            ScoringMethod::Bm25 => bm25_scores(stats, query_terms, candidates),
            ScoringMethod::Custom => hybrid_scores(stats, documents, query_terms, candidates),
        }
    }
}

impl FromStr for ScoringMethod {
    type Err = std::convert::Infallible;

    /// Never fails; see [`ScoringMethod::parse_or_default`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_or_default(s))
    }
}

impl fmt::Display for ScoringMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cosine similarity between the query and each candidate's TF-IDF vector.
/// Only strictly positive similarities are returned.
pub fn tfidf_cosine_scores<S: AsRef<str>>(stats: &CorpusStatistics, query_terms: &[S], candidates: &[DocId]) -> Scores {
    let mut scores = Scores::new();
    if candidates.is_empty() {
        return scores;
    }

    // ordered so the floating-point sums are identical on every call
    let mut q_tf: BTreeMap<&str, u32> = BTreeMap::new();
    for t in query_terms {
        *q_tf.entry(t.as_ref()).or_insert(0) += 1;
    }
    let mut q_weights: Vec<(&str, f64)> = Vec::with_capacity(q_tf.len());
    let mut q_sq = 0.0;
    for (term, f) in q_tf {
        let w = log_tf(f) * stats.idf_tfidf(term);
        if w != 0.0 {
            q_weights.push((term, w));
            q_sq += w * w;
        }
    }
    let q_norm = q_sq.sqrt();
    if q_norm == 0.0 {
        return scores;
    }

    for &doc_id in candidates {
        let d_norm = stats.doc_norm(doc_id);
        if d_norm == 0.0 {
            continue;
        }
        let dot: f64 = q_weights.iter().map(|(t, w)| w * stats.tfidf_weight(doc_id, t)).sum();
        if dot > 0.0 {
            scores.insert(doc_id, dot / (q_norm * d_norm));
        }
    }
    scores
}

/// Okapi BM25 with fixed `k1 = 1.5`, `b = 0.75`.
pub fn bm25_scores<S: AsRef<str>>(stats: &CorpusStatistics, query_terms: &[S], candidates: &[DocId]) -> Scores {
    let mut scores = Scores::new();
    if candidates.is_empty() {
        return scores;
    }
    let unique: BTreeSet<&str> = query_terms.iter().map(AsRef::as_ref).collect();

    for &doc_id in candidates {
        let dl = stats.doc_len(doc_id);
        if dl == 0 {
            continue;
        }
        let length_norm = 1.0 - BM25_B + BM25_B * dl as f64 / stats.avg_doc_len;
        let mut s = 0.0;
        for term in &unique {
            let f = stats.tf(doc_id, term);
            if f == 0 {
                continue;
            }
            let f = f as f64;
            s += stats.idf_bm25(term) * (f * (BM25_K1 + 1.0)) / (f + BM25_K1 * length_norm);
        }
        if s != 0.0 {
            scores.insert(doc_id, s);
        }
    }
    scores
}

/// Cosine TF-IDF scaled by each document's [`numeric_boost`].
pub fn hybrid_scores<S: AsRef<str>>(stats: &CorpusStatistics, documents: &[Document], query_terms: &[S], candidates: &[DocId]) -> Scores {
    tfidf_cosine_scores(stats, query_terms, candidates)
        .into_iter()
        .filter_map(|(doc_id, score)| documents.get(doc_id as usize).map(|doc| (doc_id, score * numeric_boost(doc))))
        .collect()
}

fn rating_norm(doc: &Document) -> f64 {
    (doc.average_rating.unwrap_or(0.0) / RATING_SCALE).clamp(0.0, 1.0)
}

fn discount_norm(doc: &Document) -> f64 {
    (doc.discount_pct.unwrap_or(0.0) / DISCOUNT_SCALE).clamp(0.0, 1.0)
}

/// Cheaper is better; unknown price sits in the middle.
fn price_norm(price: f64) -> f64 {
    if price <= 0.0 { 0.5 } else { 1.0 - price.min(PRICE_CAP) / PRICE_CAP }
}

/// Query-independent business multiplier in `[0.2, 2.2)`.
///
/// Missing rating and discount count as 0; the price is the selling price,
/// falling back to the list price.
pub fn numeric_boost(doc: &Document) -> f64 {
    let stock_factor = if doc.out_of_stock { OUT_OF_STOCK_FACTOR } else { 1.0 };
    let boost = 1.0 + 0.5 * rating_norm(doc) + 0.4 * discount_norm(doc) + 0.3 * price_norm(doc.effective_price());
    boost * stock_factor
}

/// Value-for-money helper signal in `[0, 1]`, rounded to 4 decimals, handed to
/// downstream consumers alongside the ranking. Ignores stock, and reads only
/// the selling price: a missing one counts as unknown even when a list price
/// is present.
pub fn value_score(doc: &Document) -> f64 {
    let price = price_norm(doc.selling_price.unwrap_or(0.0));
    let raw = 0.5 * rating_norm(doc) + 0.35 * discount_norm(doc) + 0.15 * price;
    (raw * 10_000.0).round() / 10_000.0
}
