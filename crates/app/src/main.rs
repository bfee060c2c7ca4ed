//! Harbor CLI - Main entry point

use clap::{Parser, Subcommand};
use harbor_app::{commands, AppConfig, Page};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "harbor")]
#[command(about = "Harbor - money market and incentive engine", long_about = None)]
struct Cli {
    /// Application config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a genesis file without running it
    ValidateGenesis {
        /// Genesis file path
        genesis: PathBuf,
    },

    /// Import a genesis and run a block script against it
    Replay {
        /// Genesis file path
        #[arg(long)]
        genesis: PathBuf,
        /// JSON array of blocks to run
        #[arg(long)]
        blocks: PathBuf,
        /// Directory of the JSONL event store (overrides the config)
        #[arg(long)]
        events: Option<PathBuf>,
        /// Write the final state as a genesis file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Print the records of an event store
    Events {
        /// Event store directory
        dir: PathBuf,
        /// Only events of this kind (e.g. hard_deposit)
        #[arg(long)]
        kind: Option<String>,
    },

    /// Print positions, claims and market figures of a genesis file
    Show {
        /// Genesis file path
        genesis: PathBuf,
        /// Filter by owner address
        #[arg(long)]
        owner: Option<String>,
        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: usize,
        /// Records per page
        #[arg(long, default_value = "100")]
        limit: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_json_file(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::ValidateGenesis { genesis } => {
            commands::validate_genesis(&genesis)?;
        }

        Commands::Replay {
            genesis,
            blocks,
            events,
            export,
        } => {
            let config = AppConfig {
                event_store_path: events.or(config.event_store_path),
                ..config
            };
            commands::replay(config, &genesis, &blocks, export.as_deref())?;
        }

        Commands::Events { dir, kind } => {
            commands::events(&dir, kind.as_deref())?;
        }

        Commands::Show {
            genesis,
            owner,
            page,
            limit,
        } => {
            commands::show(&genesis, owner.as_deref(), Page::new(page, limit))?;
        }
    }

    Ok(())
}
