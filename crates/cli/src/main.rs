//! Nightjar CLI, the main entry point.
//!
//! Commands:
//! - `ask`: Single message or interactive conversation
//! - `estimate`: Estimate the token cost of a text
//! - `artifact`: Fetch an artifact through the cache
//! - `config`: Show, locate or validate the configuration
//! - `status`: Show configuration and service reachability

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "nightjar",
    about = "Nightjar: budgeted LLM requests with graceful local fallback",
    version
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
    /// Ask for a recommendation
    Ask {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Extra situational context sent with every message
        #[arg(short, long, default_value = "")]
        context: String,

        /// Never contact the remote service
        #[arg(long)]
        offline: bool,
    },

    /// Estimate the token cost of a text
    Estimate {
        text: String,
    },

    /// Fetch an artifact through the artifact cache
    Artifact {
        url: String,

        /// Write the bytes to this file
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show configuration and service reachability
    Status,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Validate the configuration
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Ask {
            message,
            context,
            offline,
        } => commands::ask::run(message, context, offline).await?,
        Commands::Estimate { text } => commands::estimate::run(&text),
        Commands::Artifact { url, output } => commands::artifact::run(&url, output).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show()?,
            ConfigAction::Path => commands::config_cmd::path(),
            ConfigAction::Validate => commands::config_cmd::validate()?,
        },
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
