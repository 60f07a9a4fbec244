//! Aurora CLI - chat with whichever model fits the question.

use clap::{Parser, Subcommand};

mod commands;
mod render;

/// Aurora - routes every prompt to the right local or cloud model
#[derive(Parser)]
#[command(name = "aurora")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat
    Chat,

    /// Answer a single prompt and exit
    Ask {
        /// Prompt text
        prompt: Vec<String>,
    },

    /// Show which model a prompt would be routed to, without answering
    Route {
        /// Prompt text
        prompt: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List catalog models and on-device install status
    Models,

    /// Manage on-device models
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Show configuration and data paths
    Info,
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download an on-device model
    Pull {
        /// Model id (default: qwen3-0.6)
        id: Option<String>,
    },
    /// Delete a downloaded on-device model
    Remove {
        /// Model id
        id: String,
    },
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "warn" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| miette::miette!("Failed to start async runtime: {}", e))?;

    match cli.command {
        Commands::Chat => runtime.block_on(commands::chat::run()),
        Commands::Ask { prompt } => runtime.block_on(commands::ask::run(&prompt.join(" "))),
        Commands::Route { prompt, json } => {
            runtime.block_on(commands::route::run(&prompt.join(" "), json))
        }
        Commands::Models => commands::models::run(),
        Commands::Model { action } => match action {
            ModelAction::Pull { id } => runtime.block_on(commands::model::pull(id.as_deref())),
            ModelAction::Remove { id } => commands::model::remove(&id),
        },
        Commands::Info => commands::info::run(),
    }
}
