//! sira CLI: the main entry point.
//!
//! Commands:
//! - `init`: create a conversation directory with defaults
//! - `run`: send the conversation, stream the reply, append it

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sira_config::MarkerStyle;

mod commands;

#[derive(Parser)]
#[command(
    name = "sira",
    about = "sira: prompt templates as plain-text conversation files",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a conversation directory with params.toml and conversation.md
    Init {
        /// Directory to create
        dir: PathBuf,

        /// Marker syntax: hash or bracket
        #[arg(long, default_value = "hash")]
        markers: MarkerStyle,

        /// Completion provider (openai, mistral, openrouter, ollama, ...)
        #[arg(long)]
        provider: Option<String>,

        /// Model identifier
        #[arg(long)]
        model: Option<String>,
    },

    /// Run one turn of the conversation in a directory
    #[command(alias = "exec")]
    Run {
        /// Conversation directory
        dir: PathBuf,

        /// Credential file (defaults to ~/.sira/credentials)
        #[arg(long, env = "SIRA_CREDENTIALS")]
        credentials: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries only the reply
    let filter = if cli.verbose {
        "warn,sira=debug,sira_core=debug,sira_config=debug,sira_providers=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Init {
            dir,
            markers,
            provider,
            model,
        } => commands::init::run(&dir, markers, provider, model),
        Commands::Run { dir, credentials } => commands::run::run(&dir, credentials).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("sira: {e}");
            ExitCode::FAILURE
        }
    }
}
