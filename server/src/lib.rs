use anyhow::{bail, Context, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use search_core::boolean;
use search_core::index::InvertedIndex;
use search_core::normalize::Lemmatizer;
use search_core::persist::{self, IndexPaths};
use search_core::ranker::{ScoredDoc, VectorIndex, DEFAULT_TOP_K};
use search_core::store::Store;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}

fn default_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: String,
    pub score: f64,
}

#[derive(Deserialize)]
pub struct BooleanParams {
    pub q: String,
}

#[derive(Serialize)]
pub struct BooleanResponse {
    pub query: String,
    pub total_hits: usize,
    /// Sorted document ids; empty means "no documents found", which is
    /// a successful outcome, unlike a rejected query (HTTP 400).
    pub docs: Vec<String>,
}

pub struct SearchState {
    pub index: InvertedIndex,
    pub vectors: VectorIndex,
    pub lemmatizer: Lemmatizer,
}

/// Load all query-time structures once and serve read-only from them.
pub fn build_app(store_dir: &str, index_dir: &str) -> Result<Router> {
    let store =
        Store::open(store_dir).with_context(|| format!("open store directory {store_dir}"))?;
    let lemmatizer = Lemmatizer::from_store(&store)?;

    let paths = IndexPaths::new(index_dir);
    let meta = persist::load_meta(&paths)?;
    let index = persist::load_index_listing(&paths, &store)?;
    let vectors = VectorIndex::load(&paths)?;
    // A truncated index directory must fail at startup, not serve
    // rankings over a partial corpus.
    if vectors.num_docs() as u32 != meta.num_docs {
        bail!(
            "index directory {index_dir} is incomplete: meta.json declares {} documents but {} weight vectors are present",
            meta.num_docs,
            vectors.num_docs()
        );
    }
    tracing::info!(
        num_docs = meta.num_docs,
        num_terms = index.num_terms(),
        "loaded query-time index"
    );

    let state = Arc::new(SearchState {
        index,
        vectors,
        lemmatizer,
    });

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/boolean", get(boolean_handler))
        .with_state(state)
        .layer(cors);
    Ok(app)
}

/// Vector-space search: cosine-ranked top-k.
pub async fn search_handler(
    State(state): State<Arc<SearchState>>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let k = params.k.clamp(1, 100);
    let hits = state.vectors.rank(&params.q, &state.lemmatizer);
    let total_hits = hits.len();
    let results = hits
        .into_iter()
        .take(k)
        .map(|ScoredDoc { doc_id, score }| SearchHit { doc_id, score })
        .collect();
    Json(SearchResponse {
        query: params.q,
        took_s: start.elapsed().as_secs_f64(),
        total_hits,
        results,
    })
}

/// Boolean retrieval. A malformed query is rejected with 400; an empty
/// result set is a 200 with no documents.
pub async fn boolean_handler(
    State(state): State<Arc<SearchState>>,
    Query(params): Query<BooleanParams>,
) -> Result<Json<BooleanResponse>, (StatusCode, String)> {
    match boolean::search(&params.q, &state.index, &state.lemmatizer) {
        Ok(docs) => {
            let docs: Vec<String> = docs.into_iter().collect();
            Ok(Json(BooleanResponse {
                query: params.q,
                total_hits: docs.len(),
                docs,
            }))
        }
        Err(err) => Err((StatusCode::BAD_REQUEST, format!("malformed query: {err}"))),
    }
}
