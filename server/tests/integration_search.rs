use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use papersearch_core::{CorpusSource, JsonCorpus, SearchConfig};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

const TOKEN: &str = "s3cret";

fn write_corpus(path: &Path, papers: Value) {
    fs::write(path, serde_json::to_vec(&papers).unwrap()).unwrap();
}

fn sample_papers() -> Value {
    serde_json::json!([
        {"paper_id": "p1", "title": "Attention Is All You Need",
         "abstract": "We propose the Transformer, a model architecture based solely on attention mechanisms.",
         "authors": "Vaswani, Shazeer, Parmar", "categories": "cs.CL cs.LG", "published": "2017-06-12"},
        {"paper_id": "p2", "title": "A Survey on Graph Neural Networks",
         "abstract": "This survey provides a comprehensive overview of graph neural networks.",
         "authors": "Wu, Pan, Chen", "categories": "cs.LG", "published": "2019-01-01"},
        {"paper_id": "p3", "title": "Deep Reinforcement Learning with Double Q-learning",
         "abstract": "We reduce overestimation by decoupling action selection and evaluation.",
         "authors": "van Hasselt, Guez, Silver", "categories": "cs.LG cs.AI", "published": "2015-09-01"}
    ])
}

struct Fixture {
    dir: TempDir,
    app: Router,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        write_corpus(&dir.path().join("papers.json"), sample_papers());
        let source: Arc<dyn CorpusSource> = Arc::new(JsonCorpus::new(dir.path().join("papers.json")));
        let index_dir = dir.path().join("index");
        let engine = server::load_engine(source.as_ref(), Some(&index_dir), SearchConfig::default()).unwrap();
        let state = server::AppState {
            engine: Arc::new(engine),
            source,
            index_dir: Some(index_dir),
            admin_token: Some(TOKEN.to_string()),
        };
        Self { dir, app: server::build_app(state) }
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

fn result_ids(json: &Value) -> Vec<String> {
    json["results"].as_array().unwrap().iter().map(|r| r["id"].as_str().unwrap().to_string()).collect()
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let fx = Fixture::new();
    let (status, json) = get(&fx.app, "/api/search?q=transformer%20attention&limit=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result_ids(&json)[0], "p1");
    assert!(json["results"][0]["score"].as_f64().unwrap() > 0.0);
    assert_eq!(json["count"], 3);
    assert_eq!(json["effective_query_terms"], serde_json::json!(["transformer", "attention"]));
    assert_eq!(json["results"][0]["primary_category"], "cs.CL");
}

#[tokio::test]
async fn filters_apply_and_bad_years_are_ignored() {
    let fx = Fixture::new();
    let (status, json) = get(&fx.app, "/api/search?q=graph&category=cs.LG&year_min=abc&sort_by=date_asc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result_ids(&json), vec!["p3", "p2"]);

    let (_, json) = get(&fx.app, "/api/search?q=&year_min=2016&author=wu").await;
    assert_eq!(result_ids(&json), vec!["p2"]);
}

#[tokio::test]
async fn unknown_sort_mode_is_rejected() {
    let fx = Fixture::new();
    let (status, json) = get(&fx.app, "/api/search?q=graph&sort_by=popularity").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("popularity"));
}

#[tokio::test]
async fn malformed_params_get_a_json_error() {
    let fx = Fixture::new();
    for uri in ["/api/search?q=graph&limit=ten", "/api/search?q=graph&semantic=maybe"] {
        let (status, json) = get(&fx.app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(json["error"].is_string(), "{uri}: {json}");
    }
}

#[tokio::test]
async fn facets_and_stats_reflect_corpus() {
    let fx = Fixture::new();
    let (_, facets) = get(&fx.app, "/api/facets").await;
    assert_eq!(facets["categories"], serde_json::json!(["cs.CL", "cs.LG"]));
    assert_eq!(facets["year_range"], serde_json::json!([2015, 2019]));

    let (_, stats) = get(&fx.app, "/api/stats").await;
    assert_eq!(stats["total_papers"], 3);
    assert_eq!(stats["categories"]["cs.LG"], 2);
}

#[tokio::test]
async fn suggestions_and_papers() {
    let fx = Fixture::new();
    let (_, json) = get(&fx.app, "/api/suggestions?q=robot").await;
    assert_eq!(json["suggestions"][0], "robot robotics");

    let (status, json) = get(&fx.app, "/api/papers/p2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "A Survey on Graph Neural Networks");

    let (status, _) = get(&fx.app, "/api/papers/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn startup_writes_a_snapshot() {
    let fx = Fixture::new();
    assert!(fx.dir.path().join("index/snapshot.bin").is_file());
    assert!(fx.dir.path().join("index/meta.json").is_file());
}

fn reload(token: Option<&str>) -> Request<Body> {
    let mut req = Request::post("/admin/reload");
    if let Some(t) = token {
        req = req.header("X-ADMIN-TOKEN", t);
    }
    req.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn reload_requires_token() {
    let fx = Fixture::new();
    let (status, _) = send(&fx.app, reload(None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&fx.app, reload(Some("wrong"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn reload_swaps_corpus_and_failed_reload_keeps_serving() {
    let fx = Fixture::new();
    let corpus_path = fx.dir.path().join("papers.json");
    let mut papers = sample_papers();
    papers.as_array_mut().unwrap().push(serde_json::json!({
        "id": "p4", "title": "Graph Attention Networks", "abstract": "attention over graphs",
        "category": "stat.ML", "published": "2017-10-30"
    }));
    write_corpus(&corpus_path, papers);

    let (status, report) = send(&fx.app, reload(Some(TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["num_docs"], 4);
    assert_eq!(report["generation"], 2);

    let (_, facets) = get(&fx.app, "/api/facets").await;
    assert_eq!(facets["categories"], serde_json::json!(["cs.CL", "cs.LG", "stat.ML"]));

    fs::write(&corpus_path, "{ this is not json").unwrap();
    let (status, _) = send(&fx.app, reload(Some(TOKEN))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (_, json) = get(&fx.app, "/api/search?q=graph").await;
    assert_eq!(json["count"], 4);
    let (_, root) = get(&fx.app, "/").await;
    assert_eq!(root["generation"], 2);
}
