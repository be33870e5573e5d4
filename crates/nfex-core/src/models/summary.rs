//! Per-product summary rows.

use rust_decimal::Decimal;
use serde::Serialize;

/// One row per distinct product code in a batch.
///
/// Produced sorted by `total_quantity` descending. Records without a
/// product code are excluded from this aggregation entirely.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    /// Product code the row groups on.
    pub product_code: String,

    /// First non-null name observed for this code, in record order.
    /// A product sold under several names keeps only the first one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,

    /// First non-null NCM observed for this code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ncm_code: Option<String>,

    /// Sum of quantity over all contributing records.
    pub total_quantity: Decimal,

    /// Sum of line totals over all contributing records.
    pub total_value: Decimal,

    /// Arithmetic mean of unit price over all contributing records.
    pub mean_unit_price: Decimal,

    /// Most frequent CFOP within the group; ties resolved by the
    /// first-encountered value among the tied modes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant_cfop: Option<String>,

    /// Number of records in the group.
    pub record_count: u64,
}
