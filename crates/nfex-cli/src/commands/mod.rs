//! CLI subcommands.

pub mod analyze;
pub mod extract;

use clap::ValueEnum;
use nfex_core::{DocumentClass, LineItem};

/// Document class as a CLI flag.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ClassArg {
    /// Outgoing invoices (sales)
    Sale,
    /// Incoming invoices (purchases)
    Purchase,
}

impl From<ClassArg> for DocumentClass {
    fn from(arg: ClassArg) -> Self {
        match arg {
            ClassArg::Sale => DocumentClass::Sale,
            ClassArg::Purchase => DocumentClass::Purchase,
        }
    }
}

/// Serialize line items to CSV, one row per record.
pub fn records_to_csv(records: &[LineItem]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "source_id",
        "document_class",
        "emitted_at",
        "product_code",
        "product_name",
        "ncm_code",
        "cfop_code",
        "barcode",
        "quantity",
        "unit_price",
        "line_total",
    ])?;

    for record in records {
        wtr.write_record([
            record.source_id.as_str(),
            record.document_class.label(),
            &record
                .emitted_at
                .map(|ts| ts.to_rfc3339())
                .unwrap_or_default(),
            record.product_code.as_deref().unwrap_or(""),
            record.product_name.as_deref().unwrap_or(""),
            record.ncm_code.as_deref().unwrap_or(""),
            record.cfop_code.as_deref().unwrap_or(""),
            record.barcode.as_deref().unwrap_or(""),
            &record.quantity.to_string(),
            &record.unit_price.to_string(),
            &record.line_total.to_string(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}
