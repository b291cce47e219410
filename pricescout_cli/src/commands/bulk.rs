//! The `bulk` subcommand: compare a CSV of quoted rates against the market.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use pricescout_lib::{BulkRow, SearchService};

use crate::output::{print_bulk, OutputFormat};

#[derive(Args)]
pub struct BulkArgs {
    /// CSV file with an `item,rate,qty` header
    pub file: PathBuf,

    /// Currency symbol for printed amounts
    #[arg(long, default_value = "₹")]
    pub currency: String,
}

pub fn read_rows<R: std::io::Read>(reader: R) -> Result<Vec<BulkRow>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for (i, record) in rdr.deserialize::<BulkRow>().enumerate() {
        let row = record.with_context(|| format!("row {} is not item,rate,qty", i + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

pub async fn run(args: &BulkArgs, service: &SearchService, format: &OutputFormat) -> Result<()> {
    let file = std::fs::File::open(&args.file)
        .with_context(|| format!("cannot open {}", args.file.display()))?;
    let rows = read_rows(file)?;
    if rows.is_empty() {
        anyhow::bail!("{} has no rows", args.file.display());
    }

    eprintln!(
        "Comparing {} items, {} at a time",
        rows.len(),
        service.config().bulk_batch_size
    );
    let pb = ProgressBar::new(rows.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>4}/{len:4} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let report = service
        .bulk_compare_with(rows, |row| {
            pb.set_message(row.item.clone());
            pb.inc(1);
        })
        .await?;
    pb.finish_and_clear();

    if report.totals.unpriced_rows > 0 {
        eprintln!(
            "{} of {} items had no live prices",
            report.totals.unpriced_rows,
            report.rows.len()
        );
    }
    print_bulk(&report, &args.currency, format)
}
