//! Parlance CLI - image captioning and fallback text translation service.
//!
//! Parlance serves `POST /predict` (captioning, delegated upstream) and
//! `POST /translate`, which tries a local MarianMT model first and falls back
//! to free remote translation APIs.
//!
//! # Usage
//!
//! ```bash
//! # Run the HTTP service
//! parlance serve --port 10000
//!
//! # One-off translation
//! parlance translate "Good morning" --to fr
//!
//! # Pre-fetch local models
//! parlance models download fr de es
//!
//! # View configuration
//! parlance config show
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use parlance_core::Config;

mod cli;
mod logging;
mod server;

/// Parlance - image captioning and fallback text translation service.
#[derive(Parser, Debug)]
#[command(name = "parlance")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the platform default
    #[arg(short, long, global = true, env = "PARLANCE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP service
    Serve(cli::serve::ServeArgs),

    /// Translate text once through the provider chain
    Translate(cli::translate::TranslateArgs),

    /// Manage local translation models (download, list, etc.)
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    // An explicitly requested file must load; the default one may be broken.
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => match Config::load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to load config: {e}\n  \
                     Using default configuration. Check your config file with `parlance config path`."
                );
                Config::default()
            }
        },
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);
    config.apply_env();

    tracing::debug!("Parlance v{}", parlance_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Translate(args) => cli::translate::execute(args, config).await,
        Commands::Models(args) => cli::models::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, config, &config_path).await,
    }
}
