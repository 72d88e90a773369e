use anyhow::Result;
use clap::Parser;
use papersearch_core::{CorpusSource, JsonCorpus, SearchConfig};
use server::{build_app, load_engine, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Corpus path: a JSON/JSONL file or a directory of them
    #[arg(long, default_value = "./papers_data.json")]
    corpus: PathBuf,
    /// Index snapshot directory; rebuilt and rewritten when missing or stale
    #[arg(long)]
    index: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Ranked candidates kept per requested result before filtering
    #[arg(long, default_value_t = papersearch_core::config::DEFAULT_OVERFETCH_FACTOR)]
    overfetch: usize,
    /// Largest accepted page size
    #[arg(long, default_value_t = papersearch_core::config::DEFAULT_MAX_LIMIT)]
    max_limit: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let config = SearchConfig::default().with_overfetch_factor(args.overfetch).with_max_limit(args.max_limit);
    let source: Arc<dyn CorpusSource> = Arc::new(JsonCorpus::new(&args.corpus));
    let engine = load_engine(source.as_ref(), args.index.as_deref(), config)?;
    let state = AppState {
        engine: Arc::new(engine),
        source,
        index_dir: args.index.clone(),
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
    };
    let app = build_app(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
