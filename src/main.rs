//! # docchat CLI
//!
//! The `docchat` binary launches the chat web UI and provides shell
//! conveniences for the same ingest and query plumbing the UI uses.
//!
//! ## Usage
//!
//! ```bash
//! docchat --config ./config/docchat.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docchat serve` | Start the chat web UI |
//! | `docchat ingest <FILE>...` | Extract and ingest documents |
//! | `docchat query "<question>"` | Ask a one-shot question |
//! | `docchat modes` | List the query modes |
//!
//! ## Examples
//!
//! ```bash
//! # Start the UI on the configured bind address
//! docchat serve
//!
//! # Ingest a couple of documents against the configured engine
//! docchat ingest notes.md report.pdf
//!
//! # One-shot question; files are ingested first, then queried
//! docchat query "summarize the report" --file report.pdf --mode global
//! ```
//!
//! The API key is read from the environment variable named by
//! `engine.api_key_env` (default `GEMINI_API_KEY`); the web UI also
//! accepts it from the sidebar.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docchat::config;
use docchat::engine::HttpRagEngine;
use docchat::ingest;
use docchat::models::QueryMode;
use docchat::query;
use docchat::server;
use docchat::session::Session;

/// docchat — chat with your documents through an external RAG engine.
#[derive(Parser)]
#[command(
    name = "docchat",
    about = "Chat with your documents — a thin front end over an external RAG engine",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/docchat.toml`; built-in defaults apply when
    /// the file does not exist.
    #[arg(long, global = true, default_value = "./config/docchat.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Start the chat web UI.
    ///
    /// Binds to `[server].bind` and serves the single-page chat interface
    /// plus its JSON API. This is the one launch command a deployment needs.
    Serve,

    /// Extract and ingest documents from the shell.
    ///
    /// Each file is extracted and submitted to the engine independently;
    /// a failing file does not abort the rest.
    Ingest {
        /// Files to ingest (.txt, .md, .pdf, .docx).
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Ask a one-shot question.
    ///
    /// The session lives for this invocation only, so pass the documents
    /// to ingest with `--file`; querying with none ingested fails with
    /// the empty-index condition.
    Query {
        /// The question to ask.
        question: String,

        /// Query mode: hybrid, local, global, or naive.
        #[arg(long, default_value = "hybrid")]
        mode: QueryMode,

        /// Document to ingest before asking (repeatable).
        #[arg(long = "file")]
        files: Vec<PathBuf>,
    },

    /// List the query modes and what they are for.
    Modes,
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();

    // `modes` needs no config or engine.
    if let Commands::Modes = cli.command {
        for mode in QueryMode::ALL {
            println!("{:<8} {}", mode.as_str(), mode.description());
        }
        return Ok(());
    }

    let cfg = config::load_config_or_default(&cli.config)?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Ingest { files } => {
            let engine = HttpRagEngine::new(&cfg.engine)?;
            let mut session = Session::with_api_key(cfg.resolve_api_key());
            ingest::run_ingest(&engine, &cfg, &mut session, &files).await?;
        }
        Commands::Query {
            question,
            mode,
            files,
        } => {
            let engine = HttpRagEngine::new(&cfg.engine)?;
            let mut session = Session::with_api_key(cfg.resolve_api_key());
            query::run_query(&engine, &cfg, &mut session, &question, mode, &files).await?;
        }
        Commands::Modes => unreachable!(),
    }

    Ok(())
}
