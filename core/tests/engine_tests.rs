use shopsearch_core::persist::{save_artifacts, ArtifactPaths};
use shopsearch_core::{
    corpus_by_pid, numeric_boost, ArtifactError, Artifacts, DocId, DocIdMapFile, Document, InvertedIndex, RankingEngine,
    ScoringMethod, SearchOptions,
};
use std::collections::{HashMap, HashSet};
use std::fs;
use tempfile::tempdir;

fn product(pid: &str, clean: &str) -> Document {
    Document {
        product_id: pid.into(),
        title: format!("Product {pid}"),
        title_clean: Some(clean.into()),
        url: Some(format!("https://marketplace.example/{pid}")),
        ..Default::default()
    }
}

/// Index exactly the terms of each document's clean fields.
fn artifacts(docs: Vec<Document>) -> Artifacts {
    let mut postings: HashMap<String, Vec<DocId>> = HashMap::new();
    for (doc_id, doc) in docs.iter().enumerate() {
        let mut seen = HashSet::new();
        let text = [&doc.title_clean, &doc.description_clean, &doc.metadata_clean]
            .iter()
            .filter_map(|f| f.as_deref())
            .collect::<Vec<_>>()
            .join(" ");
        for term in text.split_whitespace() {
            if seen.insert(term.to_string()) {
                postings.entry(term.to_string()).or_default().push(doc_id as DocId);
            }
        }
    }
    let pids: Vec<String> = docs.iter().map(|d| d.product_id.clone()).collect();
    Artifacts::new(docs, InvertedIndex::from_postings(postings), DocIdMapFile::from_pids(&pids)).unwrap()
}

fn engine(docs: Vec<Document>) -> RankingEngine {
    RankingEngine::from_artifacts(artifacts(docs))
}

fn pids(hits: &[shopsearch_core::ResultItem]) -> Vec<&str> {
    hits.iter().map(|h| h.pid.as_str()).collect()
}

fn shoe_corpus() -> Vec<Document> {
    vec![product("A", "shoe run"), product("B", "shoe"), product("C", "run red")]
}

#[test]
fn and_query_returns_only_full_match() {
    let e = engine(shoe_corpus());
    let corpus = corpus_by_pid(e.documents());
    let hits = e.search("shoe running", "1", &corpus, ScoringMethod::Bm25, 20, true);
    assert_eq!(pids(&hits), vec!["A"]);
    assert!(hits[0].ranking > 0.0);
}

#[test]
fn or_query_returns_all_with_full_match_first() {
    let e = engine(shoe_corpus());
    let corpus = corpus_by_pid(e.documents());
    let hits = e.search("shoe running", "1", &corpus, ScoringMethod::Bm25, 20, false);
    let mut got = pids(&hits);
    assert_eq!(got[0], "A");
    got.sort();
    assert_eq!(got, vec!["A", "B", "C"]);
}

#[test]
fn unknown_term_yields_nothing() {
    let e = engine(shoe_corpus());
    let corpus = corpus_by_pid(e.documents());
    for use_and in [true, false] {
        for method in [ScoringMethod::TfIdf, ScoringMethod::Bm25, ScoringMethod::Custom] {
            assert!(e.search("umbrella", "1", &corpus, method, 20, use_and).is_empty());
        }
    }
}

#[test]
fn in_stock_scores_five_times_out_of_stock() {
    let mut in_stock = product("IN", "linen shirt");
    let mut sold_out = product("OUT", "linen shirt");
    for d in [&mut in_stock, &mut sold_out] {
        d.average_rating = Some(4.2);
        d.discount_pct = Some(35.0);
        d.selling_price = Some(799.0);
    }
    sold_out.out_of_stock = true;
    let e = engine(vec![in_stock, sold_out, product("Z", "wool scarf")]);
    let corpus = corpus_by_pid(e.documents());

    let hits = e.search("linen shirts", "9", &corpus, ScoringMethod::Custom, 20, true);
    assert_eq!(pids(&hits), vec!["IN", "OUT"]);
    let ratio = hits[0].ranking / hits[1].ranking;
    assert!((ratio - 5.0).abs() < 1e-12, "ratio was {ratio}");
}

#[test]
fn k_limits_to_best_results() {
    let docs = vec![
        product("P0", "dress"),
        product("P1", "dress dress dress"),
        product("P2", "dress cotton summer floral maxi"),
        product("P3", "dress dress"),
        product("P4", "dress cotton"),
        product("P5", "jacket"),
    ];
    let e = engine(docs);
    let corpus = corpus_by_pid(e.documents());

    let all = e.search("dress", "3", &corpus, ScoringMethod::Bm25, 20, true);
    assert_eq!(all.len(), 5);
    let top = e.search("dress", "3", &corpus, ScoringMethod::Bm25, 2, true);
    assert_eq!(top.len(), 2);
    assert_eq!(top, all[..2].to_vec());
    assert!(top[0].ranking >= top[1].ranking);
    assert!(top[1].ranking >= all[2].ranking);
}

#[test]
fn empty_corpus_serves_empty_results() {
    let e = RankingEngine::from_artifacts(Artifacts::new(Vec::new(), InvertedIndex::new(), DocIdMapFile::default()).unwrap());
    let corpus = corpus_by_pid(e.documents());
    for method in [ScoringMethod::TfIdf, ScoringMethod::Bm25, ScoringMethod::Custom] {
        assert!(e.search("red shoes", "1", &corpus, method, 20, true).is_empty());
    }
    assert_eq!(e.stats().avg_doc_len, 0.0);
}

#[test]
fn empty_query_yields_nothing() {
    let e = engine(shoe_corpus());
    let corpus = corpus_by_pid(e.documents());
    assert!(e.search("", "1", &corpus, ScoringMethod::Bm25, 20, true).is_empty());
    assert!(e.search("the and of", "1", &corpus, ScoringMethod::Bm25, 20, true).is_empty());
}

fn catalog() -> Vec<Document> {
    let mut docs = vec![
        product("D0", "slim fit denim jean blue"),
        product("D1", "cotton shirt blue formal"),
        product("D2", "running shoe sport mesh"),
        product("D3", "leather shoe formal black"),
        product("D4", "cotton kurta festive"),
        product("D5", "denim jacket blue"),
        product("D6", "sport sock cotton pack"),
        product("D7", "formal shirt white slim fit"),
    ];
    for (i, d) in docs.iter_mut().enumerate() {
        d.average_rating = Some(2.5 + (i as f64) * 0.3);
        d.discount_pct = Some((i * 10) as f64);
        d.selling_price = Some(300.0 + (i as f64) * 450.0);
        d.out_of_stock = i % 3 == 0;
        d.description_clean = Some(format!("{} cloth", d.title_clean.as_deref().unwrap_or("")));
    }
    docs
}

const QUERIES: &[&str] = &[
    "blue denim",
    "formal shirt",
    "cotton",
    "sport shoes",
    "slim fit jeans",
    "black leather",
    "festive kurta blue",
    "wool",
];

#[test]
fn repeated_searches_are_identical() {
    let e = engine(catalog());
    let corpus = corpus_by_pid(e.documents());
    for q in QUERIES {
        for method in [ScoringMethod::TfIdf, ScoringMethod::Bm25, ScoringMethod::Custom] {
            let first = e.search(q, "s", &corpus, method, 20, true);
            for _ in 0..3 {
                assert_eq!(e.search(q, "s", &corpus, method, 20, true), first);
            }
        }
    }
}

#[test]
fn and_candidates_are_subset_of_or() {
    let e = engine(catalog());
    for q in QUERIES {
        let terms = e.tokenize_query(q);
        let and: HashSet<DocId> = e.index().candidates_and(&terms).into_iter().collect();
        let or: HashSet<DocId> = e.index().candidates_or(&terms).into_iter().collect();
        assert!(and.is_subset(&or), "query {q:?}");
    }
}

#[test]
fn cosine_scores_are_within_unit_interval() {
    let e = engine(catalog());
    for q in QUERIES {
        let terms = e.tokenize_query(q);
        let options = SearchOptions { method: ScoringMethod::TfIdf, k: 100, use_and: false };
        for (_, score) in e.rank(&terms, &options) {
            assert!(score > 0.0 && score <= 1.0 + 1e-9, "query {q:?} score {score}");
        }
    }
}

#[test]
fn boost_stays_in_range() {
    for doc in catalog() {
        let b = numeric_boost(&doc);
        assert!(b > 0.0 && b < 2.2);
    }
    let best = Document { average_rating: Some(5.0), discount_pct: Some(80.0), selling_price: Some(1.0), ..Default::default() };
    assert!(numeric_boost(&best) < 2.2);
    let worst = Document { selling_price: Some(9000.0), out_of_stock: true, ..Default::default() };
    assert!((numeric_boost(&worst) - 0.2).abs() < 1e-12);
}

#[test]
fn concurrent_queries_match_sequential() {
    let e = engine(catalog());
    let corpus = corpus_by_pid(e.documents());
    let expected: Vec<_> = QUERIES.iter().map(|q| e.search(q, "c", &corpus, ScoringMethod::Bm25, 5, true)).collect();
    let (e, corpus) = (&e, &corpus);
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(move |_| {
                s.spawn(move || QUERIES.iter().map(|q| e.search(q, "c", corpus, ScoringMethod::Bm25, 5, true)).collect::<Vec<_>>())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
}

#[test]
fn engine_loads_from_disk() {
    let dir = tempdir().unwrap();
    let paths = ArtifactPaths::new(dir.path());
    save_artifacts(&paths, &artifacts(shoe_corpus())).unwrap();
    let e = RankingEngine::load(&paths).unwrap();
    assert_eq!(e.num_docs(), 3);
    let corpus = corpus_by_pid(e.documents());
    assert_eq!(pids(&e.search("shoe run", "1", &corpus, ScoringMethod::Bm25, 20, true)), vec!["A"]);
}

#[test]
fn out_of_range_postings_abort_loading() {
    let dir = tempdir().unwrap();
    let paths = ArtifactPaths::new(dir.path());
    save_artifacts(&paths, &artifacts(shoe_corpus())).unwrap();
    fs::write(&paths.inverted_index, r#"{"shoe": [0, 1], "run": [0, 2, 3]}"#).unwrap();
    match RankingEngine::load(&paths) {
        Err(ArtifactError::DocIdOutOfRange { doc_id, num_docs, .. }) => {
            assert_eq!(doc_id, 3);
            assert_eq!(num_docs, 3);
        }
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("engine built from inconsistent index"),
    }
}

#[test]
fn doc_map_domain_mismatch_aborts_loading() {
    let dir = tempdir().unwrap();
    let paths = ArtifactPaths::new(dir.path());
    save_artifacts(&paths, &artifacts(shoe_corpus())).unwrap();
    fs::write(&paths.doc_id_map, r#"{"docid_to_pid": {"0": "A", "1": "B"}}"#).unwrap();
    assert!(matches!(RankingEngine::load(&paths), Err(ArtifactError::DocIdMapDomain { mapped: 2, num_docs: 3 })));
}
