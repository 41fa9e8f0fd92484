use anyhow::{Context, Result};
use axum::{extract::{Query, State}, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use shopsearch_core::{
    corpus_by_pid, value_score, ArtifactPaths, CorpusLookup, Document, RankingEngine, ResultItem, ScoringMethod, SearchOptions,
    DEFAULT_K,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_K: usize = 100;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory holding the corpus and `index/`.
    pub data_dir: PathBuf,
    /// Corpus file outside the data directory's default names.
    pub corpus: Option<PathBuf>,
    pub default_method: ScoringMethod,
    pub default_k: usize,
}

impl ServerConfig {
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self { data_dir: data_dir.into(), corpus: None, default_method: ScoringMethod::Bm25, default_k: DEFAULT_K }
    }
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub method: Option<String>,
    pub k: Option<usize>,
    #[serde(default = "default_and")]
    pub and: bool,
}
fn default_and() -> bool { true }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub search_id: u64,
    pub method: ScoringMethod,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub item: ResultItem,
    /// Value-for-money signal for downstream consumers; not part of ranking.
    pub value_score: f64,
}

#[derive(Deserialize)]
pub struct DocDetailsParams {
    pub pid: String,
    pub search_id: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RankingEngine>,
    pub corpus: Arc<HashMap<String, Document>>,
    pub default_method: ScoringMethod,
    pub default_k: usize,
    next_search_id: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(engine: RankingEngine, default_method: ScoringMethod, default_k: usize) -> Self {
        let corpus = corpus_by_pid(engine.documents());
        Self {
            engine: Arc::new(engine),
            corpus: Arc::new(corpus),
            default_method,
            default_k,
            next_search_id: Arc::new(AtomicU64::new(1)),
        }
    }

    fn assign_search_id(&self) -> u64 {
        self.next_search_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Load artifacts and build the router. Artifact problems are returned as
/// errors so startup aborts instead of serving a partial index.
pub fn build_app(config: &ServerConfig) -> Result<Router> {
    let mut paths = ArtifactPaths::new(&config.data_dir);
    if let Some(corpus) = &config.corpus {
        paths = paths.with_corpus(corpus);
    }
    let engine = RankingEngine::load(&paths)
        .with_context(|| format!("loading search artifacts from {}", config.data_dir.display()))?;
    Ok(router(AppState::new(engine, config.default_method, config.default_k)))
}

pub fn router(app_state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc_details", get(doc_details_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let search_id = state.assign_search_id();
    let method = params.method.as_deref().map_or(state.default_method, ScoringMethod::parse_or_default);
    let k = params.k.unwrap_or(state.default_k).min(MAX_K);
    let options = SearchOptions { method, k, use_and: params.and };

    let items = state.engine.search_with(&params.q, &search_id.to_string(), state.corpus.as_ref(), &options);
    let results: Vec<SearchHit> = items
        .into_iter()
        .map(|item| {
            let value_score = state.corpus.lookup(&item.pid).map_or(0.0, value_score);
            SearchHit { item, value_score }
        })
        .collect();

    let elapsed = start.elapsed();
    tracing::info!(search_id, %method, k, hits = results.len(), took_s = elapsed.as_secs_f64(), "search served");
    Json(SearchResponse {
        query: params.q,
        search_id,
        method,
        took_s: elapsed.as_secs_f64(),
        total_hits: results.len(),
        results,
    })
}

pub async fn doc_details_handler(
    State(state): State<AppState>,
    Query(params): Query<DocDetailsParams>,
) -> Result<Json<Document>, (StatusCode, Json<serde_json::Value>)> {
    tracing::debug!(pid = %params.pid, search_id = ?params.search_id, "doc details");
    match state.corpus.lookup(&params.pid) {
        Some(doc) => Ok(Json(doc.clone())),
        None => Err((StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not found", "pid": params.pid })))),
    }
}
