use anyhow::Result;
use pricescout_lib::bulk::{BulkReport, GstSummary};
use pricescout_lib::{LocalStore, MarketAnalysis, PriceAggregate, PriceCandidate, SearchRecord};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Self {
        match value {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            "md" | "markdown" => OutputFormat::Markdown,
            _ => OutputFormat::Table,
        }
    }
}

#[derive(Tabled, Serialize)]
struct ResultRow {
    #[tabled(rename = "Product")]
    #[serde(rename = "Product")]
    name: String,
    #[tabled(rename = "Price")]
    #[serde(rename = "Price")]
    price: String,
    #[tabled(rename = "Source")]
    #[serde(rename = "Source")]
    source: String,
    #[tabled(rename = "Found Via")]
    #[serde(rename = "Found Via")]
    found_via: String,
    #[tabled(rename = "URL")]
    #[serde(rename = "URL")]
    url: String,
}

#[derive(Tabled, Serialize)]
struct SummaryRow {
    #[tabled(rename = "Stat")]
    #[serde(rename = "Stat")]
    stat: String,
    #[tabled(rename = "Price")]
    #[serde(rename = "Price")]
    price: String,
    #[tabled(rename = "Source")]
    #[serde(rename = "Source")]
    source: String,
    #[tabled(rename = "URL")]
    #[serde(rename = "URL")]
    url: String,
}

#[derive(Tabled, Serialize)]
struct StoreLine {
    #[tabled(rename = "Store")]
    #[serde(rename = "Store")]
    name: String,
    #[tabled(rename = "Type")]
    #[serde(rename = "Type")]
    business_type: String,
    #[tabled(rename = "Address")]
    #[serde(rename = "Address")]
    address: String,
    #[tabled(rename = "Match")]
    #[serde(rename = "Match")]
    relevant: String,
}

#[derive(Tabled, Serialize)]
struct BulkLine {
    #[tabled(rename = "Item")]
    #[serde(rename = "Item")]
    item: String,
    #[tabled(rename = "Qty")]
    #[serde(rename = "Qty")]
    qty: String,
    #[tabled(rename = "Your Rate")]
    #[serde(rename = "Your Rate")]
    user_rate: String,
    #[tabled(rename = "Min")]
    #[serde(rename = "Min")]
    min: String,
    #[tabled(rename = "Median")]
    #[serde(rename = "Median")]
    median: String,
    #[tabled(rename = "Max")]
    #[serde(rename = "Max")]
    max: String,
    #[tabled(rename = "Diff vs Median")]
    #[serde(rename = "Diff vs Median")]
    median_diff: String,
    #[tabled(rename = "Sources")]
    #[serde(rename = "Sources")]
    sources: String,
}

#[derive(Tabled, Serialize)]
struct GstLine {
    #[tabled(rename = "Section")]
    #[serde(rename = "Section")]
    section: String,
    #[tabled(rename = "Taxable Amount")]
    #[serde(rename = "Taxable Amount")]
    taxable: String,
    #[tabled(rename = "CGST")]
    #[serde(rename = "CGST")]
    cgst: String,
    #[tabled(rename = "SGST")]
    #[serde(rename = "SGST")]
    sgst: String,
    #[tabled(rename = "Round Off")]
    #[serde(rename = "Round Off")]
    round_off: String,
    #[tabled(rename = "Grand Total")]
    #[serde(rename = "Grand Total")]
    grand_total: String,
}

#[derive(Tabled, Serialize)]
struct HistoryLine {
    #[tabled(rename = "When")]
    #[serde(rename = "When")]
    searched_at: String,
    #[tabled(rename = "Query")]
    #[serde(rename = "Query")]
    query: String,
    #[tabled(rename = "Country")]
    #[serde(rename = "Country")]
    country: String,
    #[tabled(rename = "Results")]
    #[serde(rename = "Results")]
    results: usize,
    #[tabled(rename = "Min")]
    #[serde(rename = "Min")]
    min: String,
    #[tabled(rename = "Median")]
    #[serde(rename = "Median")]
    median: String,
    #[tabled(rename = "Max")]
    #[serde(rename = "Max")]
    max: String,
}

// -- Row builders --

fn build_result_rows(results: &[PriceCandidate]) -> Vec<ResultRow> {
    results
        .iter()
        .map(|c| ResultRow {
            name: c.name.clone(),
            price: format_price(&c.currency_symbol, c.extracted_price),
            source: c.source_name.clone(),
            found_via: c.search_engine.clone(),
            url: c.source_url.clone(),
        })
        .collect()
}

fn build_summary_rows(aggregate: &PriceAggregate, symbol: &str) -> Vec<SummaryRow> {
    [
        ("Minimum", &aggregate.min),
        ("Median", &aggregate.median),
        ("Maximum", &aggregate.max),
    ]
    .into_iter()
    .map(|(stat, point)| match point {
        Some(p) => SummaryRow {
            stat: stat.to_string(),
            price: format_price(symbol, p.price),
            source: p.source.clone(),
            url: p.url.clone(),
        },
        None => SummaryRow {
            stat: stat.to_string(),
            price: "N/A".to_string(),
            source: String::new(),
            url: String::new(),
        },
    })
    .collect()
}

fn build_store_lines(stores: &[LocalStore]) -> Vec<StoreLine> {
    stores
        .iter()
        .map(|s| StoreLine {
            name: s.name.clone(),
            business_type: s.categories.join(", "),
            address: s.address.clone(),
            relevant: if s.is_relevant { "yes" } else { "" }.to_string(),
        })
        .collect()
}

fn analysis_lines(analysis: &MarketAnalysis, symbol: &str) -> Vec<String> {
    let mut lines = vec![
        format!(
            "{}: {} listings, average {}, spread {} ({:.1}%)",
            analysis.product_name,
            analysis.count,
            format_price(symbol, analysis.average),
            format_price(symbol, analysis.spread),
            analysis.variation_pct
        ),
    ];
    if let (Some(min), Some(max)) = (analysis.typical_min, analysis.typical_max) {
        lines.push(format!(
            "Typical range: {} - {}",
            format_price(symbol, min),
            format_price(symbol, max)
        ));
    }
    match &analysis.best_value {
        Some(best) => lines.push(format!(
            "Best value: {} at {} from {}",
            best.name,
            format_price(symbol, best.price),
            best.source
        )),
        None => lines.push("Best value: compare the listings above".to_string()),
    }
    lines
}

fn build_bulk_lines(report: &BulkReport, symbol: &str) -> Vec<BulkLine> {
    let opt = |v: Option<f64>| v.map(|p| format_price(symbol, p)).unwrap_or_else(|| "N/A".to_string());
    report
        .rows
        .iter()
        .map(|r| BulkLine {
            item: r.item.clone(),
            qty: format_quantity(r.qty),
            user_rate: format_price(symbol, r.user_rate),
            min: opt(r.aggregate.min_price()),
            median: opt(r.aggregate.median_price()),
            max: opt(r.aggregate.max_price()),
            median_diff: r
                .diffs
                .median
                .map(|d| format_signed(symbol, d.rate_diff))
                .unwrap_or_else(|| "N/A".to_string()),
            sources: r.source_urls().join(" "),
        })
        .collect()
}

fn build_gst_lines(gst: &GstSummary, symbol: &str) -> Vec<GstLine> {
    gst.sections
        .iter()
        .map(|s| GstLine {
            section: s.label.clone(),
            taxable: format_price(symbol, s.taxable),
            cgst: format_price(symbol, s.cgst),
            sgst: format_price(symbol, s.sgst),
            round_off: format_signed(symbol, s.round_off),
            grand_total: format_price(symbol, s.grand_total),
        })
        .collect()
}

fn build_history_lines(records: &[SearchRecord]) -> Vec<HistoryLine> {
    records
        .iter()
        .map(|r| {
            let opt = |v: Option<f64>| {
                v.map(|p| format_price(&r.currency_symbol, p))
                    .unwrap_or_else(|| "N/A".to_string())
            };
            HistoryLine {
                searched_at: r.searched_at.format("%Y-%m-%d %H:%M").to_string(),
                query: r.query.clone(),
                country: r.country.clone(),
                results: r.results_count,
                min: opt(r.min_price),
                median: opt(r.median_price),
                max: opt(r.max_price),
            }
        })
        .collect()
}

fn render<T: Tabled>(rows: Vec<T>, format: &OutputFormat) -> String {
    let mut table = Table::new(rows);
    if *format == OutputFormat::Markdown {
        table.with(Style::markdown());
    }
    table.to_string()
}

fn write_csv<T: Serialize>(rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

// -- Printers (table / markdown / csv; JSON goes through print_json) --

pub fn print_results(results: &[PriceCandidate], aggregate: &PriceAggregate, symbol: &str, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Csv => write_csv(&build_result_rows(results)),
        OutputFormat::Json => {
            print_json(&results);
            Ok(())
        }
        _ => {
            println!("{}", render(build_result_rows(results), format));
            println!();
            println!("{}", render(build_summary_rows(aggregate, symbol), format));
            Ok(())
        }
    }
}

pub fn print_analysis(analysis: &MarketAnalysis, symbol: &str, format: &OutputFormat) {
    if matches!(format, OutputFormat::Table | OutputFormat::Markdown) {
        println!();
        for line in analysis_lines(analysis, symbol) {
            println!("{}", line);
        }
    }
}

pub fn print_stores(stores: &[LocalStore], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Csv => write_csv(&build_store_lines(stores)),
        OutputFormat::Json => {
            print_json(&stores);
            Ok(())
        }
        _ => {
            println!("{}", render(build_store_lines(stores), format));
            Ok(())
        }
    }
}

pub fn print_bulk(report: &BulkReport, symbol: &str, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Csv => write_csv(&build_bulk_lines(report, symbol)),
        OutputFormat::Json => {
            print_json(report);
            Ok(())
        }
        _ => {
            println!("{}", render(build_bulk_lines(report, symbol), format));
            println!();
            println!("{}", render(build_gst_lines(&report.gst, symbol), format));
            for d in &report.gst.differences {
                println!(
                    "vs {}: {} ({})",
                    d.against,
                    format_signed(symbol, d.difference),
                    d.verdict.label()
                );
            }
            Ok(())
        }
    }
}

pub fn print_history(records: &[SearchRecord], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Csv => write_csv(&build_history_lines(records)),
        OutputFormat::Json => {
            print_json(&records);
            Ok(())
        }
        _ => {
            println!("{}", render(build_history_lines(records), format));
            Ok(())
        }
    }
}

// -- JSON output --

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

/// Groups the integer part in threes: `₹74,999`, `$1,299.50`.
fn format_price(symbol: &str, value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    if frac == 0 {
        format!("{}{}{}", sign, symbol, grouped)
    } else {
        format!("{}{}{}.{:02}", sign, symbol, grouped, frac)
    }
}

fn format_signed(symbol: &str, value: f64) -> String {
    if value > 0.0 && (value * 100.0).round() > 0.0 {
        format!("+{}", format_price(symbol, value))
    } else {
        format_price(symbol, value)
    }
}

fn format_quantity(qty: f64) -> String {
    if qty.fract() == 0.0 {
        format!("{}", qty as i64)
    } else {
        format!("{}", qty)
    }
}
