//! # pdfchat CLI
//!
//! The `pdfchat` binary drives the full pipeline: batch ingestion of
//! source PDFs, resource listing, one-shot questions from the terminal,
//! and the HTTP API.
//!
//! ## Usage
//!
//! ```bash
//! pdfchat --config ./pdfchat.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pdfchat ingest` | Index every PDF in `[paths].source_dir` (idempotent) |
//! | `pdfchat resources` | List resources with a complete index |
//! | `pdfchat ask <resource> "<question>"` | Answer one question with citations |
//! | `pdfchat serve` | Start the HTTP API on `[server].bind` |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use pdfchat::catalog;
use pdfchat::chain::RetrievalChain;
use pdfchat::config::load_config;
use pdfchat::embedding::OpenAiEmbedder;
use pdfchat::generation::OpenAiGenerator;
use pdfchat::ingest::run_ingest;
use pdfchat::server::{run_server, AppState};

/// pdfchat — chat with your PDF documents through retrieval-augmented
/// generation.
#[derive(Parser)]
#[command(
    name = "pdfchat",
    about = "Chat with your PDF documents through retrieval-augmented generation",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./pdfchat.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every PDF under the configured source directory.
    ///
    /// Resources that already have a complete index are skipped, so
    /// re-running on an unchanged corpus performs no embedding calls.
    /// A failure on one file does not abort the rest of the batch.
    Ingest,

    /// List resources that have a complete, loadable index.
    Resources,

    /// Ask a single question against one resource and print the answer
    /// with its cited source passages.
    Ask {
        /// Resource name, as reported by `pdfchat resources`.
        resource: String,
        /// The question to answer.
        question: String,
    },

    /// Start the HTTP API server.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Ingest => {
            let embedder = OpenAiEmbedder::new(&config.embedding, &config.http)?;
            let report = run_ingest(&config, &embedder).await?;
            if !report.failed.is_empty() {
                std::process::exit(1);
            }
        }
        Commands::Resources => {
            let mut names = catalog::list_available(&config.paths.index_dir);
            names.sort();
            for name in names {
                println!("{}", name);
            }
        }
        Commands::Ask { resource, question } => {
            let embedder = OpenAiEmbedder::new(&config.embedding, &config.http)?;
            let generator = OpenAiGenerator::new(&config.generation, &config.http)?;
            let chain = RetrievalChain::new(&config, &embedder, &generator);
            let response = chain.answer(&resource, &question, &[]).await?;

            println!("{}", response.text);
            if !response.source_documents.is_empty() {
                println!();
                println!("Sources:");
                for chunk in &response.source_documents {
                    let preview: String = chunk.text.chars().take(120).collect();
                    println!("  [{} #{}] {}", chunk.source, chunk.chunk_index, preview);
                }
            }
        }
        Commands::Serve => {
            let embedder = OpenAiEmbedder::new(&config.embedding, &config.http)?;
            let generator = OpenAiGenerator::new(&config.generation, &config.http)?;
            let state = AppState {
                config: Arc::new(config),
                embedder: Arc::new(embedder),
                generator: Arc::new(generator),
            };
            run_server(state).await?;
        }
    }

    Ok(())
}
