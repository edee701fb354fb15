use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use search_core::index::InvertedIndex;
use search_core::persist::{self, IndexPaths, MetaFile};
use search_core::stats::CorpusStats;
use search_core::store::Store;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build the inverted index and TF-IDF weight files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build all query-time artifacts from a token/lemma store
    Build {
        /// Store directory holding tokens_{n}.txt / lemmas_{n}.txt
        #[arg(long)]
        store: String,
        /// Output directory for the index and weight files
        #[arg(long)]
        output: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { store, output } => build(&store, &output),
    }
}

fn build(store_dir: &str, output: &str) -> Result<()> {
    let store =
        Store::open(store_dir).with_context(|| format!("open store directory {store_dir}"))?;
    let paths = IndexPaths::new(output);

    let index = InvertedIndex::build(&store)?;
    persist::save_index_listing(&paths, &index)?;
    tracing::info!(
        num_docs = store.num_docs(),
        num_terms = index.num_terms(),
        "wrote inverted index listing"
    );

    // Pass one: corpus-wide document frequencies. No weight line is
    // emitted until the DF tables cover the full corpus.
    let stats = CorpusStats::compute(&store)?;

    // Pass two: per-document weight files against the frozen tables.
    for &num in store.doc_nums() {
        let doc = store.load(num)?;
        persist::save_weights(&paths.token_weights(num), &stats.token_weights(&doc))?;
        persist::save_weights(&paths.lemma_weights(num), &stats.lemma_weights(&doc))?;
    }

    let meta = MetaFile {
        num_docs: store.num_docs(),
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
        version: 1,
    };
    persist::save_meta(&paths, &meta)?;

    tracing::info!(output, "index build complete");
    Ok(())
}
