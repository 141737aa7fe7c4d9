use clap::{Parser, Subcommand};
use erev_ai_context::ChunkConfig;
use erev_ai_embed::{EmbedConfig, EmbeddingProvider, FastEmbedProvider};
use erev_ai_index::{BuildConfig, IndexStore, build_index};
use serde::Serialize;
use std::path::PathBuf;
use std::process;

/// A CLI tool to build and inspect the document knowledge-base index.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the persisted index files
    #[arg(short, long, default_value = "data/knowledge_base")]
    index_dir: PathBuf,

    /// Directory where embedding model files are cached
    #[arg(long, default_value = "models")]
    model_cache: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build (or wholly rebuild) the index from a directory of documents
    Build {
        /// Directory of source documents (.txt, .md, .pdf)
        #[arg(short, long, default_value = "docs/knowledge_base")]
        docs_dir: PathBuf,
        /// Maximum chunk length in characters
        #[arg(long, default_value_t = 1200)]
        max_chars: usize,
        /// Overlap between consecutive chunks in characters
        #[arg(long, default_value_t = 200)]
        overlap: usize,
    },
    /// Search the index for chunks similar to a query
    Search {
        /// The query text
        query: String,
        /// Maximum number of results
        #[arg(short = 'k', long, default_value_t = 4)]
        top_k: usize,
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
    /// Show statistics about the persisted index
    Stats,
}

#[derive(Debug, Clone, PartialEq)]
enum OutputFormat {
    Summary,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(OutputFormat::Summary),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid format: {s}")),
        }
    }
}

#[derive(Serialize)]
struct HitOutput {
    score: f32,
    source: String,
    doc_id: String,
    sequence: usize,
    text: String,
}

#[derive(Serialize)]
struct IndexStats {
    model: String,
    dimension: usize,
    chunks: usize,
    sources: Vec<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let store = IndexStore::new(&args.index_dir);

    match args.command {
        Commands::Build {
            docs_dir,
            max_chars,
            overlap,
        } => {
            let provider =
                FastEmbedProvider::load(EmbedConfig::default_with_cache(&args.model_cache))
                    .await?;
            let chunking = ChunkConfig::default()
                .with_max_chars(max_chars)
                .with_overlap(overlap);
            let config =
                BuildConfig::new(docs_dir, &args.index_dir).with_chunking(chunking);

            let report = build_index(&config, &provider).await?;
            println!(
                "Indexed {} documents into {} chunks (dimension {}, model {})",
                report.documents, report.chunks, report.dimension, report.model
            );
        }
        Commands::Search {
            query,
            top_k,
            format,
        } => {
            let index = store.load().await?;
            let provider = FastEmbedProvider::load(
                EmbedConfig::new(index.model_id(), &args.model_cache),
            )
            .await?;

            let query_vector = provider.embed(&query).await?;
            let hits = index.search(&query_vector, top_k)?;

            let outputs: Vec<HitOutput> = hits
                .into_iter()
                .map(|hit| HitOutput {
                    score: hit.score,
                    source: hit.chunk.source,
                    doc_id: hit.chunk.doc_id,
                    sequence: hit.chunk.sequence,
                    text: hit.chunk.text,
                })
                .collect();

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outputs)?),
                OutputFormat::Summary => {
                    for (i, hit) in outputs.iter().enumerate() {
                        println!(
                            "{}. [{:.3}] {} #{}\n   {}",
                            i + 1,
                            hit.score,
                            hit.source,
                            hit.sequence,
                            preview(&hit.text, 160)
                        );
                    }
                }
            }
        }
        Commands::Stats => {
            let index = store.load().await?;
            let stats = IndexStats {
                model: index.model_id().to_string(),
                dimension: index.dimension(),
                chunks: index.len(),
                sources: index.sources(),
            };
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}…")
    }
}
