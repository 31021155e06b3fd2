mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meetbot")]
#[command(about = "Automate recurring meeting issues: schedules, agendas and notes")]
struct Cli {
    /// Config file (defaults to ./meetbot.toml, then ~/.config/meetbot/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the next meeting issue if one is due, with agenda and notes
    Run,
    /// Show what `run` would do, without writing anything
    Status,
    /// Print the next scheduled occurrence
    Next {
        /// Show the next occurrence of every schedule, not just the earliest
        #[arg(long)]
        all: bool,
    },
    /// Close a meeting issue
    Close {
        /// Issue number to close
        number: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run => commands::run(&cfg).await,
        Commands::Status => commands::status(&cfg).await,
        Commands::Next { all } => commands::next(&cfg, all),
        Commands::Close { number } => commands::close(&cfg, number).await,
    }
}
