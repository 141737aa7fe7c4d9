use clap::Parser;
use erev_ai_embed::{EmbedConfig, FastEmbedProvider};
use erev_ai_qa::{Assistant, AssistantConfig, GenerationConfig};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

/// Ask a question against the local document knowledge base.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The question to ask
    question: String,

    /// Directory holding the persisted index files
    #[arg(short, long, default_value = "data/knowledge_base")]
    index_dir: PathBuf,

    /// Directory where embedding model files are cached
    #[arg(long, default_value = "models")]
    model_cache: PathBuf,

    /// Number of chunks to retrieve as context
    #[arg(short = 'k', long, default_value_t = 4)]
    top_k: usize,

    /// Ollama base URL (defaults to OLLAMA_URL or the local endpoint)
    #[arg(long)]
    ollama_url: Option<String>,

    /// Generation model (defaults to OLLAMA_MODEL or llama3.2:1b)
    #[arg(long)]
    model: Option<String>,

    /// Timeout for one generation call, in seconds
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,

    /// Print the retrieved context chunks before the answer
    #[arg(long)]
    show_context: bool,
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

    let mut generation =
        GenerationConfig::from_env().with_timeout(Duration::from_secs(args.timeout_secs));
    if let Some(url) = args.ollama_url {
        generation = generation.with_base_url(url);
    }
    if let Some(model) = args.model {
        generation = generation.with_model(model);
    }

    let embedder = Arc::new(
        FastEmbedProvider::load(EmbedConfig::default_with_cache(&args.model_cache)).await?,
    );
    let config = AssistantConfig::new(&args.index_dir)
        .with_top_k(args.top_k)
        .with_generation(generation);
    let assistant = Assistant::open(config, embedder).await;

    let answer = assistant.ask(&args.question).await;

    if args.show_context {
        for (i, hit) in answer.context.iter().enumerate() {
            println!(
                "--- context {} (score {:.3}, {} #{}) ---",
                i + 1,
                hit.score,
                hit.chunk.source,
                hit.chunk.sequence
            );
            println!("{}\n", hit.chunk.text);
        }
    }

    if let Some(text) = &answer.text {
        println!("{text}");
        if !answer.context.is_empty() {
            let sources: Vec<&str> = answer
                .context
                .iter()
                .map(|hit| hit.chunk.source.as_str())
                .collect();
            println!("\nSources: {}", sources.join(", "));
        }
    } else if let Some(failure) = &answer.failure {
        eprintln!("No answer: {failure}");
        if !answer.context.is_empty() {
            eprintln!(
                "Retrieved {} context chunks; re-run with --show-context to inspect them.",
                answer.context.len()
            );
        }
        process::exit(1);
    }

    Ok(())
}
