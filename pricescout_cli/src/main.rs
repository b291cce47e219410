mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pricescout_lib::{AiBackend, SearchConfig, SearchService};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "pricescout")]
#[command(about = "Compare live product prices across marketplaces")]
struct Cli {
    /// Output format: table, json, csv or md
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// TOML configuration file (sources, concurrency, GST rates)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search one product across every source
    Search(commands::search::SearchArgs),
    /// Compare a CSV of quoted rates against market prices
    Bulk(commands::bulk::BulkArgs),
    /// Show recently recorded searches
    History(commands::history::HistoryArgs),
}

fn build_service(config: Option<&PathBuf>) -> Result<SearchService> {
    let config = match config {
        Some(path) => SearchConfig::load(path)?,
        None => SearchConfig::from_env()?,
    };
    Ok(SearchService::new(config, AiBackend::from_env())?)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pricescout=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.output);

    match &cli.command {
        Commands::Search(args) => {
            let service = build_service(cli.config.as_ref())?;
            commands::search::run(args, &service, &format).await?
        }
        Commands::Bulk(args) => {
            let service = build_service(cli.config.as_ref())?;
            commands::bulk::run(args, &service, &format).await?
        }
        Commands::History(args) => commands::history::run(args, &format)?,
    }

    Ok(())
}
