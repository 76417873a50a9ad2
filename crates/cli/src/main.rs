//! ExamForge CLI — the main entry point.
//!
//! Commands:
//! - `assemble`   — Assemble an exam for a user from a blueprint
//! - `blueprint`  — Inspect and validate blueprint documents
//! - `config`     — Show, locate, or validate configuration
//! - `status`     — Show content and configuration status

use clap::{Parser, Subcommand};
use examforge_config::{AppConfig, ConfigError};

mod commands;

#[derive(Parser)]
#[command(
    name = "examforge",
    about = "ExamForge — blueprint-driven certification exam assembly",
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
    /// Assemble an exam from a blueprint
    Assemble(commands::assemble::AssembleArgs),

    /// Inspect blueprint documents
    Blueprint {
        #[command(subcommand)]
        action: BlueprintAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show content and configuration status
    Status,
}

#[derive(Subcommand)]
enum BlueprintAction {
    /// List blueprint documents in the blueprint directory
    List,
    /// Print a blueprint's tasks
    Show { id: String },
    /// Decode a blueprint and report schema problems
    Validate { id: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file path
    Path,
    /// Validate the configuration
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let loaded = AppConfig::load();

    // Initialize tracing
    let (level, json) = match &loaded {
        Ok(config) => (config.logging.level.clone(), config.logging.json),
        Err(_) => ("info".to_string(), false),
    };
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Assemble(args) => commands::assemble::run(&require(loaded)?, args).await?,
        Commands::Blueprint { action } => {
            let config = require(loaded)?;
            match action {
                BlueprintAction::List => commands::blueprint::list(&config).await?,
                BlueprintAction::Show { id } => commands::blueprint::show(&config, &id).await?,
                BlueprintAction::Validate { id } => commands::blueprint::validate(&config, &id).await?,
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
        },
        Commands::Status => commands::status::run(&require(loaded)?).await?,
    }

    Ok(())
}

fn require(loaded: Result<AppConfig, ConfigError>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    loaded.map_err(|e| format!("Failed to load config: {e}").into())
}
