use crate::persist::ArtifactError;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Boolean inverted index: term -> postings sorted by doc_id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvertedIndex {
    pub postings: HashMap<String, Vec<DocId>>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    pub fn from_postings(postings: HashMap<String, Vec<DocId>>) -> Self {
        Self { postings }
    }

    pub fn get(&self, term: &str) -> Option<&[DocId]> {
        self.postings.get(term).map(Vec::as_slice)
    }

    /// Document frequency of `term`, 0 when unknown.
    pub fn df(&self, term: &str) -> usize {
        self.postings.get(term).map_or(0, Vec::len)
    }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &[DocId])> {
        self.postings.iter().map(|(t, p)| (t.as_str(), p.as_slice()))
    }

    /// Check the merge-intersection precondition and the id space: every
    /// posting list strictly increasing and every doc_id below `num_docs`.
    pub fn validate(&self, num_docs: usize) -> Result<(), ArtifactError> {
        for (term, plist) in &self.postings {
            for pair in plist.windows(2) {
                if pair[0] >= pair[1] {
                    return Err(ArtifactError::UnsortedPostings { term: term.clone() });
                }
            }
            if let Some(&last) = plist.last() {
                if last as usize >= num_docs {
                    return Err(ArtifactError::DocIdOutOfRange { term: term.clone(), doc_id: last, num_docs });
                }
            }
        }
        Ok(())
    }

    /// AND retrieval. Any unknown term short-circuits to no candidates.
    pub fn candidates_and<S: AsRef<str>>(&self, terms: &[S]) -> Vec<DocId> {
        if terms.is_empty() {
            return Vec::new();
        }
        let unique: HashSet<&str> = terms.iter().map(AsRef::as_ref).collect();
        let mut lists: Vec<&[DocId]> = Vec::with_capacity(unique.len());
        for term in unique {
            match self.get(term) {
                Some(plist) if !plist.is_empty() => lists.push(plist),
                _ => return Vec::new(),
            }
        }
        // smallest first keeps the running intersection short
        lists.sort_by_key(|l| l.len());
        let mut result = lists[0].to_vec();
        for plist in &lists[1..] {
            result = intersect_sorted(&result, plist);
            if result.is_empty() {
                break;
            }
        }
        result
    }

    /// OR retrieval. Unknown terms contribute nothing.
    pub fn candidates_or<S: AsRef<str>>(&self, terms: &[S]) -> Vec<DocId> {
        let mut union = BTreeSet::new();
        for term in terms {
            if let Some(plist) = self.get(term.as_ref()) {
                union.extend(plist.iter().copied());
            }
        }
        union.into_iter().collect()
    }
}

/// Two-pointer merge of two ascending lists.
pub fn intersect_sorted(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let (mut i, mut j) = (0, 0);
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            out.push(a[i]);
            i += 1;
            j += 1;
        } else if a[i] < b[j] {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}
