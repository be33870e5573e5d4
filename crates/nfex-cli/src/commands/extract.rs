//! Extract command - line items from a single fiscal XML file.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use nfex_core::{BatchProcessor, FailureReason, InMemoryDocument};

use super::{records_to_csv, ClassArg};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input XML file
    #[arg(required = true)]
    input: PathBuf,

    /// Document class tag stamped on the extracted records
    #[arg(short, long, value_enum, default_value = "sale")]
    class: ClassArg,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
}

pub fn run(args: ExtractArgs) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("input file not found: {}", args.input.display());
    }

    let source_id = args
        .input
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("document.xml")
        .to_owned();
    let content = fs::read(&args.input)?;

    info!("Extracting line items from {}", args.input.display());

    // A single-document batch reuses the column-wide timestamp pass.
    let report =
        BatchProcessor::new(args.class.into()).process(&[InMemoryDocument::new(source_id, content)]);

    if let Some(failure) = report.failures.first() {
        match &failure.reason {
            // A valid document with no usable items still produces
            // (empty) output; only hard failures abort.
            FailureReason::NoItems => {
                eprintln!("{} no usable line items found", style("!").yellow())
            }
            reason => anyhow::bail!("{}: {}", args.input.display(), reason),
        }
    }

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&report.records)?,
        OutputFormat::Csv => records_to_csv(&report.records)?,
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &output)?;
            println!(
                "{} Extracted {} line items to {}",
                style("✓").green(),
                report.records.len(),
                path.display()
            );
        }
        None => println!("{output}"),
    }

    Ok(())
}
