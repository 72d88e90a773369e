use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use papersearch_core::persist::{load_meta, load_snapshot, write_index, IndexPaths};
use papersearch_core::{facets, Bm25Index, Corpus, CorpusSource, JsonCorpus};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "papersearch-indexer")]
#[command(about = "Build and check BM25 index snapshots for a paper corpus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index snapshot from a JSON/JSONL corpus file or directory
    Build {
        /// Corpus path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
    },
    /// Check that a snapshot can be used with a corpus
    Verify {
        /// Corpus path (file or directory)
        #[arg(long)]
        input: String,
        /// Index directory
        #[arg(long)]
        index: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output } => build_index(&input, &output),
        Commands::Verify { input, index } => verify_index(&input, &index),
    }
}

fn load_corpus(input: &str) -> Result<Corpus> {
    let docs = JsonCorpus::new(input).load().with_context(|| format!("loading corpus from {input}"))?;
    Ok(Corpus::new(docs)?)
}

fn build_index(input: &str, output: &str) -> Result<()> {
    let corpus = load_corpus(input)?;
    let stats = facets::stats(&corpus);
    tracing::info!(num_docs = corpus.len(), categories = stats.categories.len(), "ingested documents");

    let index = Bm25Index::build(&corpus)?;
    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    let meta = write_index(&IndexPaths::new(output), &corpus, &index, created_at)?;

    tracing::info!(output, num_terms = meta.num_terms, "index build complete");
    Ok(())
}

fn verify_index(input: &str, index: &str) -> Result<()> {
    let corpus = load_corpus(input)?;
    let paths = IndexPaths::new(index);
    let snapshot = load_snapshot(&paths).with_context(|| format!("reading snapshot in {index}"))?;
    if let Err(err) = snapshot.validate(&corpus) {
        bail!("snapshot in {index} is not valid for {input}: {err}");
    }
    match load_meta(&paths) {
        Ok(meta) => println!("{}", serde_json::to_string_pretty(&meta)?),
        Err(err) => tracing::warn!(error = %err, "meta.json unreadable"),
    }
    tracing::info!(index, num_docs = corpus.len(), "snapshot is valid");
    Ok(())
}
