//! Line-item records extracted from NF-e/NFC-e documents.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which document set a batch represents.
///
/// Supplied by the caller; never derived from document content. Sales
/// and purchase archives carry the same schema, only the CFOP ranges
/// and the downstream column labels differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentClass {
    /// Outgoing invoices (notas de saída).
    Sale,
    /// Incoming invoices (notas de entrada).
    Purchase,
}

impl DocumentClass {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentClass::Sale => "sale",
            DocumentClass::Purchase => "purchase",
        }
    }

    /// Suffix used in summary column naming ("sold" / "purchased").
    pub fn summary_suffix(&self) -> &'static str {
        match self {
            DocumentClass::Sale => "sold",
            DocumentClass::Purchase => "purchased",
        }
    }
}

impl std::fmt::Display for DocumentClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One product line extracted from one fiscal document.
///
/// Created once during extraction and consumed, never mutated, by the
/// aggregation steps. `line_total` is always recomputed from
/// `quantity` and `unit_price`, never set independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Identifier of the originating document (typically the filename).
    pub source_id: String,

    /// Document class supplied by the caller for this batch.
    pub document_class: DocumentClass,

    /// Raw emission timestamp text (`dhEmi`/`dEmi`) as found in the
    /// document header. Parsed column-wide at the batch step so one
    /// odd document cannot diverge from the rest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emitted_at_text: Option<String>,

    /// Parsed emission timestamp; `None` when the text is absent or
    /// unparsable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emitted_at: Option<DateTime<FixedOffset>>,

    /// Product code (`cProd`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,

    /// Product description (`xProd`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,

    /// Mercosur tariff classification (`NCM`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ncm_code: Option<String>,

    /// Operation classification (`CFOP`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cfop_code: Option<String>,

    /// Barcode (`cEAN`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,

    /// Commercial quantity (`qCom`); 0 when absent or unparsable.
    pub quantity: Decimal,

    /// Commercial unit price (`vUnCom`); 0 when absent or unparsable.
    pub unit_price: Decimal,

    /// Line total, always `quantity * unit_price`.
    pub line_total: Decimal,
}

impl LineItem {
    /// Whether this line carries enough identity to be retained.
    ///
    /// A line with neither a product code nor a name is discarded at
    /// extraction time.
    pub fn is_identifiable(&self) -> bool {
        self.product_code.is_some() || self.product_name.is_some()
    }

    /// Recompute `line_total` from the current quantity and price.
    pub fn recompute_total(&mut self) {
        self.line_total = self.quantity * self.unit_price;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_class_labels() {
        assert_eq!(DocumentClass::Sale.label(), "sale");
        assert_eq!(DocumentClass::Purchase.summary_suffix(), "purchased");
        assert_eq!(DocumentClass::Sale.to_string(), "sale");
    }

    #[test]
    fn test_retention_identity() {
        let mut item = LineItem {
            source_id: "a.xml".into(),
            document_class: DocumentClass::Sale,
            emitted_at_text: None,
            emitted_at: None,
            product_code: None,
            product_name: None,
            ncm_code: None,
            cfop_code: None,
            barcode: None,
            quantity: Decimal::ZERO,
            unit_price: Decimal::ZERO,
            line_total: Decimal::ZERO,
        };
        assert!(!item.is_identifiable());

        item.product_name = Some("Café torrado".into());
        assert!(item.is_identifiable());
    }

    #[test]
    fn test_recompute_total() {
        let mut item = LineItem {
            source_id: "a.xml".into(),
            document_class: DocumentClass::Purchase,
            emitted_at_text: None,
            emitted_at: None,
            product_code: Some("P1".into()),
            product_name: None,
            ncm_code: None,
            cfop_code: None,
            barcode: None,
            quantity: Decimal::from(3),
            unit_price: Decimal::from(10),
            line_total: Decimal::ZERO,
        };
        item.recompute_total();
        assert_eq!(item.line_total, Decimal::from(30));
    }
}
