//! Prism CLI - run image transformation pipelines against an object store.
//!
//! Prism fetches a stored image, applies an ordered list of operations
//! (details, rotate, resize, grayscale, brightness, transform), persists the
//! result once, and prints a JSON report with one record per step.
//!
//! # Usage
//!
//! ```bash
//! # Run a pipeline request
//! prism run request.json
//!
//! # Run several requests, four at a time, as JSON Lines
//! prism run requests/*.json --format jsonl --parallel 4
//!
//! # Invoke one operation directly
//! prism op rotate --bucket photos --key cat.jpg --arg rotation_angle=90
//!
//! # View configuration
//! prism config show
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Prism - image transformation pipelines over an object store.
#[derive(Parser, Debug)]
#[command(name = "prism")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "PRISM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute pipeline requests read from JSON files
    Run(cli::run::RunArgs),

    /// Invoke a single operation against a stored image
    Op(cli::op::OpArgs),

    /// List the registered operations
    Operations,

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match cli::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `prism config path`."
            );
            prism_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Prism v{}", prism_core::VERSION);

    match cli.command {
        Commands::Run(args) => cli::run::execute(config, args).await,
        Commands::Op(args) => cli::op::execute(config, args).await,
        Commands::Operations => {
            for name in prism_core::Registry::global().names() {
                println!("{name}");
            }
            Ok(())
        }
        Commands::Config(args) => cli::config::execute(cli.config, args).await,
    }
}
