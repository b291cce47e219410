//! The `history` subcommand: recent searches from the SQLite store.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use pricescout_lib::db::DEFAULT_HISTORY_LIMIT;
use pricescout_lib::Db;

use crate::output::{print_history, OutputFormat};

#[derive(Args)]
pub struct HistoryArgs {
    /// SQLite database path
    #[arg(long, default_value = "pricescout.db")]
    pub db: PathBuf,

    /// Searches to show, newest first
    #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
    pub limit: usize,
}

pub fn run(args: &HistoryArgs, format: &OutputFormat) -> Result<()> {
    let db = Db::open(&args.db)?;
    db.init()?;
    let records = db.recent_searches(args.limit)?;
    if records.is_empty() {
        eprintln!("No searches recorded in {}", args.db.display());
        return Ok(());
    }
    print_history(&records, format)
}
