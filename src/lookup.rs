//! roster / stats commands: one-shot fetch and decode to stdout

use crate::cli::FetchArgs;
use crate::config::DEFAULT_STAT_GROUP;
use anyhow::Result;
use clap::Args;
use serde::Serialize;

#[derive(Args)]
pub struct RosterArgs {
    /// Squadron name (quote names containing spaces)
    pub name: String,

    /// Output format: json (default) or yaml
    #[arg(long, short, default_value = "json")]
    pub format: String,

    #[command(flatten)]
    pub fetch: FetchArgs,
}

#[derive(Args)]
pub struct StatsArgs {
    #[command(flatten)]
    pub lookup: RosterArgs,

    /// Stat group index within the profile header
    #[arg(long, default_value_t = DEFAULT_STAT_GROUP, allow_negative_numbers = true)]
    pub group: i64,
}

pub async fn run_roster(args: RosterArgs) -> Result<()> {
    let pages = args.fetch.build_pages().await?;
    let roster = pages.roster(&args.name).await;

    eprintln!("Done: {} players", roster.len());
    print(&roster, &args.format)
}

pub async fn run_stats(args: StatsArgs) -> Result<()> {
    let pages = args.lookup.fetch.build_pages().await?;
    let stats = pages.stats(&args.lookup.name, args.group).await;

    eprintln!("Done: {} stats", stats.len());
    print(&stats, &args.lookup.format)
}

fn print<T: Serialize>(value: &T, format: &str) -> Result<()> {
    let output = render(value, format)?;
    println!("{}", output.trim_end());
    Ok(())
}

fn render<T: Serialize>(value: &T, format: &str) -> Result<String> {
    Ok(match format {
        "yaml" | "yml" => serde_yaml::to_string(value)?,
        _ => serde_json::to_string_pretty(value)?,
    })
}
