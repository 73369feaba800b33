use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use texrag_core::config::{Config, Settings};
use texrag_core::traits::Embedder;
use texrag_embed::get_default_embedder;
use texrag_retrieve::{
    build_prompt, ContextLimits, IndexBuilder, KeywordRouter, PromptMode, Retriever,
};

#[derive(Parser)]
#[command(name = "texrag")]
#[command(about = "Index a LaTeX corpus and retrieve context for prompts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the index from the document directory
    Build {
        /// Documents directory (defaults to data.docs_dir)
        #[arg(long)]
        docs: Option<PathBuf>,
        /// Index directory (defaults to data.index_dir)
        #[arg(long)]
        index: Option<PathBuf>,
    },
    /// Print the chunks nearest to a query
    Query {
        query: String,
        /// Number of chunks (defaults to retrieval.top_k)
        #[arg(short)]
        k: Option<usize>,
        #[arg(long)]
        index: Option<PathBuf>,
    },
    /// Print the system and user prompts assembled for a query
    Prompt {
        query: String,
        /// Number of chunks (defaults to retrieval.top_k)
        #[arg(short)]
        k: Option<usize>,
        /// auto, generic, pset, cheat_sheet, manual or resume
        #[arg(long, default_value = "auto")]
        mode: String,
        #[arg(long)]
        index: Option<PathBuf>,
    },
}

fn load_embedder(config: &Config, settings: &Settings) -> anyhow::Result<Arc<dyn Embedder>> {
    let model_dir = settings.embedding.model_dir.as_deref().map(|d| config.resolve(d));
    Ok(Arc::from(get_default_embedder(&settings.embedding, model_dir.as_deref())?))
}

fn open_retriever(
    config: &Config,
    settings: &Settings,
    index: Option<PathBuf>,
) -> anyhow::Result<Retriever> {
    let index_dir = index.unwrap_or_else(|| config.resolve(&settings.data.index_dir));
    let embedder = load_embedder(config, settings)?;
    Ok(Retriever::open(&index_dir, embedder)?)
}

fn parse_mode(mode: &str) -> anyhow::Result<Option<PromptMode>> {
    if mode.eq_ignore_ascii_case("auto") {
        return Ok(None);
    }
    Ok(Some(mode.parse()?))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let settings = config.settings()?;

    match cli.command {
        Commands::Build { docs, index } => {
            let docs_dir = docs.unwrap_or_else(|| config.resolve(&settings.data.docs_dir));
            let index_dir = index.unwrap_or_else(|| config.resolve(&settings.data.index_dir));
            let embedder = load_embedder(&config, &settings)?;
            let report = IndexBuilder::from_settings(&settings)?.build_and_publish(
                &docs_dir,
                &index_dir,
                embedder.as_ref(),
            )?;
            println!(
                "Indexed {} chunks from {} documents (dim {}, model {})",
                report.chunks, report.documents, report.dim, report.model_id
            );
            println!("Snapshot: {}", report.snapshot_dir.display());
        }
        Commands::Query { query, k, index } => {
            let retriever = open_retriever(&config, &settings, index)?;
            let hits = retriever.retrieve_scored(&query, k.unwrap_or(settings.retrieval.top_k))?;
            if hits.is_empty() {
                println!("No results");
            }
            for (rank, hit) in hits.iter().enumerate() {
                let r = &hit.record;
                println!(
                    "{}. [{:.4}] {} #{} ({}; {})",
                    rank + 1,
                    hit.distance,
                    r.doc_path,
                    r.chunk_index,
                    r.doc_type,
                    r.tags.join(",")
                );
                println!("   {}", r.text);
            }
        }
        Commands::Prompt { query, k, mode, index } => {
            let mode = parse_mode(&mode)?;
            let retriever = open_retriever(&config, &settings, index)?;
            let chunks = retriever.retrieve(&query, k.unwrap_or(settings.retrieval.top_k))?;
            let mode = mode.unwrap_or_else(|| {
                KeywordRouter::new(settings.prompt.keyword_groups.clone()).route(&query, &chunks)
            });
            let limits = ContextLimits::from(&settings.prompt);
            let prompt = build_prompt(&query, &chunks, mode, &limits);
            println!("# mode: {}\n", mode);
            println!("## system\n{}\n", prompt.system.trim());
            println!("## user\n{}", prompt.user);
        }
    }
    Ok(())
}
