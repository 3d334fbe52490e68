//! Consult CLI
//!
//! Main entry point for the `consult` command-line tool: a domain-restricted
//! consultant answering from a local document store.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AdminCommand, AskCommand, IngestCommand};
use consult_core::{config::AppConfig, logging, AppError, AppResult};
use std::path::PathBuf;

/// Consult - domain consultant over a local document store
#[derive(Parser, Debug)]
#[command(name = "consult")]
#[command(about = "Domain consultant with retrieval-augmented answers", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "CONSULT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "CONSULT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask the consultant a question
    Ask(AskCommand),

    /// Add files or directories to the document store
    Ingest(IngestCommand),

    /// Inspect and edit stored vectors
    Admin(AdminCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load_with(cli.workspace.clone(), cli.config.clone())?
        .with_overrides(
            cli.workspace,
            cli.config,
            cli.log_level,
            cli.verbose,
            cli.no_color,
            cli.log_json,
        );

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_json)?;

    tracing::info!("Consult CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Store: {:?}", config.store_dir());

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Ingest(_) => "ingest",
        Commands::Admin(_) => "admin",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let run = async {
        match cli.command {
            Commands::Ask(cmd) => cmd.execute(&config).await,
            Commands::Ingest(cmd) => cmd.execute(&config).await,
            Commands::Admin(cmd) => cmd.execute(&config).await,
        }
    };

    // Dropping `run` cancels any in-flight embedding, search or generation
    let result = tokio::select! {
        result = run => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, cancelling request");
            Err(AppError::Io(std::io::Error::new(
                std::io::ErrorKind::Interrupted,
                "interrupted by Ctrl-C",
            )))
        }
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
