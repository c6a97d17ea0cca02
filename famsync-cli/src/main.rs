mod commands;
mod dates;
mod render;
mod store;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use famsync_core::FamSyncConfig;
use tracing_subscriber::EnvFilter;

use crate::store::Store;

#[derive(Parser)]
#[command(name = "famsync")]
#[command(about = "Manage the family calendar and to-do list")]
struct Cli {
    /// Use this household file instead of the configured one
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// Log debug output to stderr (overrides FAMSYNC_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List, add, rename or remove family members
    Members {
        #[command(subcommand)]
        command: commands::members::MembersCommand,
    },
    /// Calendar events
    Events {
        #[command(subcommand)]
        command: commands::events::EventsCommand,
    },
    /// To-do tasks
    Tasks {
        #[command(subcommand)]
        command: commands::tasks::TasksCommand,
    },
    /// Show a month, week or agenda view
    View(commands::view::ViewArgs),
    /// Print the agent tool catalog as JSON
    Tools,
    /// Run a single agent tool against the household
    Tool {
        name: String,

        /// Tool arguments as a JSON object
        args: Option<String>,
    },
    /// Replay a scripted assistant conversation against the household
    Agent {
        /// JSON file with the assistant's turns
        #[arg(long)]
        script: PathBuf,

        /// Accept every recommendation the assistant makes
        #[arg(long)]
        accept_all: bool,

        message: String,
    },
    /// Show configuration paths and values
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("FAMSYNC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let config = FamSyncConfig::load()?;
    let store = Store::new(cli.data_file.unwrap_or_else(|| config.data_path()));

    match cli.command {
        Commands::Members { command } => commands::members::run(&store, command),
        Commands::Events { command } => commands::events::run(&store, &config, command),
        Commands::Tasks { command } => commands::tasks::run(&store, &config, command),
        Commands::View(args) => commands::view::run(&store, &config, args),
        Commands::Tools => commands::tools::list(),
        Commands::Tool { name, args } => commands::tools::run(&store, &config, &name, args.as_deref()),
        Commands::Agent {
            script,
            accept_all,
            message,
        } => commands::agent::run(&store, &config, &script, &message, accept_all).await,
        Commands::Config => commands::config::run(&store, &config),
    }
}
