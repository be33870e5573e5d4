//! Analyze command - batch processing of sales and purchase archives.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use nfex_core::{
    count_matching_cfops, summarize_products, BatchProcessor, BatchReport, DocumentClass,
    DocumentSource, ProductSummary,
};

use super::records_to_csv;

// CFOP sets behind the fixed business counters: ordinary sales,
// tax-substitution sales, and their in-state/out-of-state purchase
// counterparts.
const SALE_STANDARD_CFOPS: &[&str] = &["5102"];
const SALE_SUBSTITUTION_CFOPS: &[&str] = &["5405"];
const PURCHASE_STANDARD_CFOPS: &[&str] = &["1102", "2102"];
const PURCHASE_SUBSTITUTION_CFOPS: &[&str] = &["1403", "2403"];

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Directory containing sales XML files
    #[arg(long)]
    sales_dir: Option<PathBuf>,

    /// Directory containing purchase XML files
    #[arg(long)]
    purchases_dir: Option<PathBuf>,

    /// Number of top products to display per class
    #[arg(long, default_value = "20")]
    top: usize,

    /// Directory to write CSV and JSON reports into
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

/// A document read lazily from disk.
struct FileDocument {
    id: String,
    path: PathBuf,
}

impl DocumentSource for FileDocument {
    fn id(&self) -> &str {
        &self.id
    }

    fn read(&self) -> std::io::Result<Vec<u8>> {
        fs::read(&self.path)
    }
}

/// Wrapper that advances the progress bar as documents are read.
struct TrackedDocument<'a> {
    inner: FileDocument,
    bar: &'a ProgressBar,
}

impl DocumentSource for TrackedDocument<'_> {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn read(&self) -> std::io::Result<Vec<u8>> {
        self.bar.inc(1);
        self.inner.read()
    }
}

#[derive(Serialize)]
struct ClassReport<'a> {
    batch: &'a BatchReport,
    summary: &'a [ProductSummary],
}

#[derive(Serialize)]
struct AnalysisReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    sales: Option<ClassReport<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    purchases: Option<ClassReport<'a>>,
}

pub fn run(args: AnalyzeArgs) -> anyhow::Result<()> {
    let start = Instant::now();

    if args.sales_dir.is_none() && args.purchases_dir.is_none() {
        anyhow::bail!("provide at least one of --sales-dir / --purchases-dir");
    }

    if let Some(output_dir) = &args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let sales = match &args.sales_dir {
        Some(dir) => run_class_batch(dir, DocumentClass::Sale)?,
        None => None,
    };
    let purchases = match &args.purchases_dir {
        Some(dir) => run_class_batch(dir, DocumentClass::Purchase)?,
        None => None,
    };

    if sales.is_none() && purchases.is_none() {
        anyhow::bail!("no documents were processed; check the configured directories");
    }

    let sales_summary = sales.as_ref().map(|r| summarize_products(&r.records));
    let purchases_summary = purchases.as_ref().map(|r| summarize_products(&r.records));

    for (report, summary) in [
        (sales.as_ref(), sales_summary.as_deref()),
        (purchases.as_ref(), purchases_summary.as_deref()),
    ] {
        let (Some(report), Some(summary)) = (report, summary) else {
            continue;
        };
        print_counters(report, summary);
        print_top_products(report.class, summary, args.top);
    }

    if let Some(output_dir) = &args.output_dir {
        write_reports(
            output_dir,
            sales.as_ref().zip(sales_summary.as_deref()),
            purchases.as_ref().zip(purchases_summary.as_deref()),
        )?;
        println!(
            "{} Reports written to {}",
            style("✓").green(),
            output_dir.display()
        );
    }

    println!();
    println!("{} Analyzed in {:?}", style("✓").green(), start.elapsed());

    Ok(())
}

/// Discover and process one class directory.
///
/// A missing directory is a warning, never an abort: the other class
/// must still get its results.
fn run_class_batch(dir: &Path, class: DocumentClass) -> anyhow::Result<Option<BatchReport>> {
    if !dir.is_dir() {
        eprintln!(
            "{} {} directory not found: {}",
            style("!").yellow(),
            class,
            dir.display()
        );
        return Ok(None);
    }

    let documents = discover_documents(dir)?;
    println!(
        "{} Processing {} {} documents from {}",
        style("ℹ").blue(),
        documents.len(),
        class,
        dir.display()
    );

    let bar = ProgressBar::new(documents.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let sources: Vec<TrackedDocument<'_>> = documents
        .into_iter()
        .map(|inner| TrackedDocument { inner, bar: &bar })
        .collect();
    let report = BatchProcessor::new(class).process(&sources);
    bar.finish_and_clear();

    println!(
        "   {} of {} documents contributed {} line items ({} failed or empty)",
        style(report.contributing).green(),
        report.total_discovered,
        report.records.len(),
        style(report.failures.len()).red()
    );
    if let Some(reason) = report.empty_reason {
        println!("   {}", style(reason).yellow());
    }
    if !report.failures.is_empty() {
        let shown: Vec<&str> = report
            .failures
            .iter()
            .take(5)
            .map(|f| f.source_id.as_str())
            .collect();
        let more = if report.failures.len() > 5 { ", ..." } else { "" };
        println!("   unprocessable: {}{}", shown.join(", "), more);
    }
    if report.degraded_fields > 0 {
        println!(
            "   {} numeric field(s) were unparsable and degraded to zero",
            style(report.degraded_fields).yellow()
        );
    }

    Ok(Some(report))
}

/// XML files in a directory, sorted by name so runs are reproducible.
fn discover_documents(dir: &Path) -> anyhow::Result<Vec<FileDocument>> {
    let mut documents = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_xml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("xml"));
        if path.is_file() && is_xml {
            let id = path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_owned();
            debug!(id, "discovered document");
            documents.push(FileDocument { id, path });
        }
    }

    documents.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(documents)
}

fn print_counters(report: &BatchReport, summary: &[ProductSummary]) {
    let (standard, substitution, standard_label, substitution_label) = match report.class {
        DocumentClass::Sale => (
            SALE_STANDARD_CFOPS,
            SALE_SUBSTITUTION_CFOPS,
            "CFOP 5102",
            "CFOP 5405 (ST)",
        ),
        DocumentClass::Purchase => (
            PURCHASE_STANDARD_CFOPS,
            PURCHASE_SUBSTITUTION_CFOPS,
            "CFOP 1102/2102",
            "CFOP 1403/2403 (ST)",
        ),
    };

    let total_value: Decimal = summary.iter().map(|row| row.total_value).sum();

    println!();
    println!(
        "{}",
        style(format!("Summary ({} documents)", report.class)).bold()
    );
    println!(
        "   {}: {}",
        standard_label,
        count_matching_cfops(&report.records, standard)
    );
    println!(
        "   {}: {}",
        substitution_label,
        count_matching_cfops(&report.records, substitution)
    );
    println!("   line items: {}", report.records.len());
    println!("   total value {}: {}", report.class.summary_suffix(), total_value);
}

fn print_top_products(class: DocumentClass, summary: &[ProductSummary], top: usize) {
    if summary.is_empty() {
        println!("   no product summary to display");
        return;
    }

    let suffix = class.summary_suffix();
    println!();
    println!(
        "{}",
        style(format!("Top {} products {} (by quantity)", top.min(summary.len()), suffix)).bold()
    );
    println!(
        "   {:<14} {:<36} {:>12} {:>14} {:>6}",
        "code",
        "name",
        format!("qty_{suffix}"),
        format!("value_{suffix}"),
        "cfop"
    );

    for row in summary.iter().take(top) {
        println!(
            "   {:<14} {:<36} {:>12} {:>14} {:>6}",
            truncate(&row.product_code, 14),
            truncate(row.product_name.as_deref().unwrap_or("-"), 36),
            row.total_quantity.to_string(),
            row.total_value.to_string(),
            row.dominant_cfop.as_deref().unwrap_or("-")
        );
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_owned()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

fn write_reports(
    output_dir: &Path,
    sales: Option<(&BatchReport, &[ProductSummary])>,
    purchases: Option<(&BatchReport, &[ProductSummary])>,
) -> anyhow::Result<()> {
    for (report, summary) in [sales, purchases].into_iter().flatten() {
        let label = report.class.label();

        let items_path = output_dir.join(format!("{label}_items.csv"));
        fs::write(&items_path, records_to_csv(&report.records)?)?;

        let summary_path = output_dir.join(format!("{label}_summary.csv"));
        fs::write(&summary_path, summary_to_csv(summary, report.class)?)?;
    }

    let combined = AnalysisReport {
        sales: sales.map(|(batch, summary)| ClassReport { batch, summary }),
        purchases: purchases.map(|(batch, summary)| ClassReport { batch, summary }),
    };
    let report_path = output_dir.join("report.json");
    fs::write(&report_path, serde_json::to_string_pretty(&combined)?)?;

    Ok(())
}

/// Summary rows as CSV, with columns suffixed by class the way the
/// downstream spreadsheet expects ("qty_total_sold" vs
/// "qty_total_purchased").
fn summary_to_csv(summary: &[ProductSummary], class: DocumentClass) -> anyhow::Result<String> {
    let suffix = class.summary_suffix();
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "product_code".to_owned(),
        "product_name".to_owned(),
        "ncm_code".to_owned(),
        format!("qty_total_{suffix}"),
        format!("value_total_{suffix}"),
        format!("mean_unit_price_{suffix}"),
        format!("dominant_cfop_{suffix}"),
        "record_count".to_owned(),
    ])?;

    for row in summary {
        wtr.write_record([
            row.product_code.clone(),
            row.product_name.clone().unwrap_or_default(),
            row.ncm_code.clone().unwrap_or_default(),
            row.total_quantity.to_string(),
            row.total_value.to_string(),
            row.mean_unit_price.to_string(),
            row.dominant_cfop.clone().unwrap_or_default(),
            row.record_count.to_string(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}
