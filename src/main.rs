//! squad-api CLI
//!
//! Serves War Thunder squadron rosters and stats over HTTP, or prints them
//! once for a single squadron.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use squad_api::lookup::{run_roster, run_stats, RosterArgs, StatsArgs};
use squad_api::server::{run_serve, ServeArgs};

#[derive(Parser)]
#[command(name = "squad-api")]
#[command(version)]
#[command(about = "War Thunder squadron roster and stats API")]
#[command(long_about = "Scrapes War Thunder squadron profile pages through headless Chrome.\n\nCommands:\n  serve    Run the HTTP API\n  roster   Print a squadron's players\n  stats    Print a squadron's stat block")]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve(ServeArgs),
    /// Print the player roster of a squadron
    Roster(RosterArgs),
    /// Print the stat block of a squadron
    Stats(StatsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Roster(args) => run_roster(args).await,
        Commands::Stats(args) => run_stats(args).await,
    }
}
