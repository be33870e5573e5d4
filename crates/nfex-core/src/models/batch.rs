//! Batch-level result types.

use serde::Serialize;

use super::record::{DocumentClass, LineItem};

/// Why a single document contributed nothing to a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum FailureReason {
    /// The document source could not be read.
    Read(String),

    /// The document markup could not be parsed.
    Malformed(String),

    /// The document parsed cleanly but yielded no usable line items.
    NoItems,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Read(detail) => write!(f, "read failed: {detail}"),
            FailureReason::Malformed(detail) => write!(f, "malformed XML: {detail}"),
            FailureReason::NoItems => f.write_str("no usable line items"),
        }
    }
}

/// One document that failed or yielded nothing.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentFailure {
    /// Identifier of the document.
    pub source_id: String,

    /// Tagged reason, so callers can report without inspecting logs.
    pub reason: FailureReason,
}

/// Why a batch produced an empty record set.
///
/// "No files found" must stay distinguishable from "files found but
/// none yielded usable data".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// The input collection was empty.
    NoDocuments,

    /// Documents were found but none produced a retained line item.
    NoUsableItems,
}

impl std::fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmptyReason::NoDocuments => f.write_str("no documents found"),
            EmptyReason::NoUsableItems => {
                f.write_str("documents found, but none yielded usable line items")
            }
        }
    }
}

/// The full set of line items for one document class, plus bookkeeping.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Document class this batch represents.
    pub class: DocumentClass,

    /// All retained line items, in discovery order.
    pub records: Vec<LineItem>,

    /// Documents the caller supplied.
    pub total_discovered: usize,

    /// Documents that contributed at least one record.
    pub contributing: usize,

    /// Documents that failed or yielded nothing.
    pub failures: Vec<DocumentFailure>,

    /// Quantity/price texts that were present but unparsable and
    /// degraded to zero. Diagnostic only; the records still carry the
    /// zero defaults.
    pub degraded_fields: usize,

    /// Set when `records` is empty, describing which empty case this is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_reason: Option<EmptyReason>,
}

impl BatchReport {
    /// An empty report for a batch with no input documents.
    pub fn empty(class: DocumentClass) -> Self {
        Self {
            class,
            records: Vec::new(),
            total_discovered: 0,
            contributing: 0,
            failures: Vec::new(),
            degraded_fields: 0,
            empty_reason: Some(EmptyReason::NoDocuments),
        }
    }

    /// Whether the batch yielded no records at all.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_report() {
        let report = BatchReport::empty(DocumentClass::Sale);
        assert!(report.is_empty());
        assert_eq!(report.empty_reason, Some(EmptyReason::NoDocuments));
        assert_eq!(report.total_discovered, 0);
    }

    #[test]
    fn test_failure_display() {
        let failure = FailureReason::Malformed("unexpected EOF".into());
        assert_eq!(failure.to_string(), "malformed XML: unexpected EOF");
        assert_eq!(FailureReason::NoItems.to_string(), "no usable line items");
    }
}
