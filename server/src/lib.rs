use anyhow::{Context, Result};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use papersearch_core::expansion::{popular_searches, suggest};
use papersearch_core::persist::{load_valid_index, write_index, IndexPaths};
use papersearch_core::{
    Corpus, CorpusSource, CorpusStats, Document, EngineError, FacetCatalog, RefreshReport, RetrievalEngine, SearchConfig,
    SearchQuery, SearchResponse, SortMode,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error;

use error::ApiError;

pub const DEFAULT_LIMIT: usize = 50;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub category: Option<String>,
    // Kept as strings so a malformed bound is ignored rather than rejected.
    pub year_min: Option<String>,
    pub year_max: Option<String>,
    pub author: Option<String>,
    #[serde(alias = "sort")]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub semantic: bool,
    #[serde(default = "default_limit")]
    pub limit: usize,
}
fn default_limit() -> usize { DEFAULT_LIMIT }

#[derive(Serialize)]
pub struct SearchEnvelope {
    #[serde(flatten)]
    pub response: SearchResponse,
    pub took_s: f64,
}

#[derive(Deserialize)]
pub struct SuggestParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RetrievalEngine>,
    pub source: Arc<dyn CorpusSource>,
    pub index_dir: Option<PathBuf>,
    pub admin_token: Option<String>,
}

/// Loads the corpus and either a validated snapshot from `index_dir` or a fresh index.
///
/// A corpus that cannot be loaded is fatal; an empty corpus starts an engine
/// that answers every search with no results.
pub fn load_engine(source: &dyn CorpusSource, index_dir: Option<&std::path::Path>, config: SearchConfig) -> Result<RetrievalEngine> {
    let docs = source.load().with_context(|| format!("loading corpus from {}", source.describe()))?;
    let corpus = Corpus::new(docs)?;
    let index = index_dir.and_then(|dir| load_valid_index(&IndexPaths::new(dir), &corpus));
    let from_snapshot = index.is_some();
    let engine = RetrievalEngine::with_index(corpus, index, config);

    if !engine.is_ready() {
        tracing::warn!(source = %source.describe(), "corpus is empty, searches will return no results");
    } else if !from_snapshot {
        if let Some(dir) = index_dir {
            persist_index(&engine, dir);
        }
    }
    tracing::info!(num_docs = engine.state().corpus.len(), from_snapshot, "engine ready");
    Ok(engine)
}

/// Writes the current index to `dir`. Failures are logged; the in-memory index keeps serving.
fn persist_index(engine: &RetrievalEngine, dir: &std::path::Path) {
    let state = engine.state();
    let Some(index) = state.index.as_ref() else { return };
    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    if let Err(err) = write_index(&IndexPaths::new(dir), &state.corpus, index, created_at) {
        tracing::warn!(dir = %dir.display(), error = %err, "failed to persist index snapshot");
    }
}

pub fn build_app(state: AppState) -> Router {
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
        .route("/", get(root_handler))
        .route("/health", get(|| async { "ok" }))
        .route("/api/search", get(search_handler))
        .route("/api/facets", get(facets_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/suggestions", get(suggestions_handler))
        .route("/api/popular", get(popular_handler))
        .route("/api/papers/:id", get(paper_handler))
        .route("/admin/reload", post(reload_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn root_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.engine.state();
    Json(serde_json::json!({
        "status": "ok",
        "ready": snapshot.index.is_some(),
        "docs": snapshot.corpus.len(),
        "generation": snapshot.generation,
        "try": "/api/search?q=transformer",
    }))
}

pub async fn search_handler(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchEnvelope>, ApiError> {
    let start = std::time::Instant::now();
    let Query(params) = params?;
    let sort = params
        .sort_by
        .as_deref()
        .unwrap_or_default()
        .parse::<SortMode>()
        .map_err(ApiError::BadRequest)?;
    let max_limit = state.engine.config().max_limit;
    let query = SearchQuery {
        text: params.q.trim().to_string(),
        category: params.category,
        year_min: parse_year(params.year_min.as_deref()),
        year_max: parse_year(params.year_max.as_deref()),
        author: params.author,
        sort,
        semantic: params.semantic,
        limit: params.limit.clamp(1, max_limit),
    };
    let response = state.engine.search(&query);
    Ok(Json(SearchEnvelope { response, took_s: start.elapsed().as_secs_f64() }))
}

fn parse_year(raw: Option<&str>) -> Option<i32> {
    raw.and_then(|s| s.trim().parse().ok())
}

async fn facets_handler(State(state): State<AppState>) -> Json<FacetCatalog> {
    Json(state.engine.facets())
}

async fn stats_handler(State(state): State<AppState>) -> Json<CorpusStats> {
    Json(state.engine.stats())
}

async fn suggestions_handler(Query(params): Query<SuggestParams>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "suggestions": suggest(params.q.trim()) }))
}

async fn popular_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "popular": popular_searches() }))
}

async fn paper_handler(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Document>, ApiError> {
    state
        .engine
        .document(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("paper {id} not found")))
}

async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<RefreshReport>, ApiError> {
    authorize(&state, &headers)?;
    let engine = state.engine.clone();
    let source = state.source.clone();
    let index_dir = state.index_dir.clone();
    let outcome = tokio::task::spawn_blocking(move || -> Result<RefreshReport, EngineError> {
        let report = engine.refresh(source.as_ref())?;
        if let Some(dir) = index_dir.as_deref() {
            persist_index(&engine, dir);
        }
        Ok(report)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("reload task failed: {e}")))?;

    outcome.map(Json).map_err(|err| {
        tracing::warn!(error = %err, "reload failed, keeping current index");
        ApiError::ServiceUnavailable(err.to_string())
    })
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(ApiError::Unauthorized("ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(ApiError::Unauthorized("invalid admin token".into()))
    }
}
