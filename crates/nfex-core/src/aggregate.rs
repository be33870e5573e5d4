//! Per-product aggregation and CFOP counters.

use indexmap::IndexMap;
use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{LineItem, ProductSummary};

/// Accumulator for one product code.
#[derive(Default)]
struct ProductGroup {
    product_name: Option<String>,
    ncm_code: Option<String>,
    total_quantity: Decimal,
    total_value: Decimal,
    price_sum: Decimal,
    record_count: u64,
    // CFOP -> occurrences, in first-seen order so the mode tie-break
    // is deterministic.
    cfop_counts: IndexMap<String, u64>,
}

impl ProductGroup {
    fn fold(&mut self, record: &LineItem) {
        if self.product_name.is_none() {
            self.product_name = record.product_name.clone();
        }
        if self.ncm_code.is_none() {
            self.ncm_code = record.ncm_code.clone();
        }
        self.total_quantity += record.quantity;
        self.total_value += record.line_total;
        self.price_sum += record.unit_price;
        self.record_count += 1;
        if let Some(cfop) = &record.cfop_code {
            *self.cfop_counts.entry(cfop.clone()).or_insert(0) += 1;
        }
    }

    /// Most frequent CFOP; ties keep the first-encountered value.
    fn dominant_cfop(&self) -> Option<String> {
        let mut best: Option<(&String, u64)> = None;
        for (cfop, &count) in &self.cfop_counts {
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((cfop, count));
            }
        }
        best.map(|(cfop, _)| cfop.clone())
    }
}

/// Group records by product code and summarize each group.
///
/// Records without a product code are excluded entirely; an empty
/// input yields an empty sequence. Rows come back sorted by total
/// quantity descending (groups tied on quantity keep first-seen
/// order).
pub fn summarize_products(records: &[LineItem]) -> Vec<ProductSummary> {
    let mut groups: IndexMap<&str, ProductGroup> = IndexMap::new();

    for record in records {
        let Some(code) = record.product_code.as_deref() else {
            continue;
        };
        groups.entry(code).or_default().fold(record);
    }

    debug!(
        records = records.len(),
        products = groups.len(),
        "summarized products"
    );

    let mut rows: Vec<ProductSummary> = groups
        .into_iter()
        .map(|(code, group)| ProductSummary {
            product_code: code.to_owned(),
            product_name: group.product_name.clone(),
            ncm_code: group.ncm_code.clone(),
            total_quantity: group.total_quantity,
            total_value: group.total_value,
            mean_unit_price: group.price_sum / Decimal::from(group.record_count),
            dominant_cfop: group.dominant_cfop(),
            record_count: group.record_count,
        })
        .collect();

    rows.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
    rows
}

/// Count records whose CFOP is a member of the target set.
///
/// Business counters pair single codes (5102) with in-state/
/// out-of-state pairs (1102/2102), so the target is a set rather
/// than a single code. Empty input counts zero, it never fails.
pub fn count_matching_cfops(records: &[LineItem], targets: &[&str]) -> usize {
    records
        .iter()
        .filter(|record| {
            record
                .cfop_code
                .as_deref()
                .is_some_and(|cfop| targets.contains(&cfop))
        })
        .count()
}
