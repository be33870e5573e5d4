//! Batch processing with per-document failure isolation.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::error::XmlError;
use crate::models::{
    BatchReport, DocumentClass, DocumentFailure, EmptyReason, FailureReason, LineItem,
};
use crate::xml::ItemExtractor;

/// A document addressable by a stable identifier and readable as XML
/// bytes. How the collection is obtained (directory listing, upload,
/// fetch) is the caller's concern.
pub trait DocumentSource {
    /// Stable identifier, used as `source_id` on extracted records.
    fn id(&self) -> &str;

    /// Read the full document content.
    fn read(&self) -> std::io::Result<Vec<u8>>;
}

/// A document held in memory, mainly for tests and embedded callers.
#[derive(Debug, Clone)]
pub struct InMemoryDocument {
    id: String,
    content: Vec<u8>,
}

impl InMemoryDocument {
    pub fn new(id: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

impl DocumentSource for InMemoryDocument {
    fn id(&self) -> &str {
        &self.id
    }

    fn read(&self) -> std::io::Result<Vec<u8>> {
        Ok(self.content.clone())
    }
}

/// Runs one batch: every document of one class, extracted and
/// assembled into a [`BatchReport`].
///
/// One bad document never aborts the batch. Read errors, malformed
/// markup, and zero-yield documents are recorded per document and
/// processing continues.
pub struct BatchProcessor {
    class: DocumentClass,
    extractor: ItemExtractor,
}

impl BatchProcessor {
    pub fn new(class: DocumentClass) -> Self {
        Self {
            class,
            extractor: ItemExtractor::new(),
        }
    }

    /// Process every source sequentially and assemble the report.
    pub fn process<S: DocumentSource>(&self, sources: &[S]) -> BatchReport {
        if sources.is_empty() {
            warn!(class = %self.class, "no documents supplied for batch");
            return BatchReport::empty(self.class);
        }

        let total_discovered = sources.len();
        let mut records: Vec<LineItem> = Vec::new();
        let mut failures: Vec<DocumentFailure> = Vec::new();
        let mut contributing = 0usize;
        let mut degraded_fields = 0usize;

        for source in sources {
            let content = match source.read() {
                Ok(content) => content,
                Err(err) => {
                    debug!(source_id = source.id(), %err, "failed to read document");
                    failures.push(DocumentFailure {
                        source_id: source.id().to_owned(),
                        reason: FailureReason::Read(err.to_string()),
                    });
                    continue;
                }
            };

            match self.extractor.try_extract(source.id(), &content, self.class) {
                Ok(extraction) if !extraction.records.is_empty() => {
                    contributing += 1;
                    degraded_fields += extraction.degraded_fields;
                    records.extend(extraction.records);
                }
                Ok(_) => {
                    failures.push(DocumentFailure {
                        source_id: source.id().to_owned(),
                        reason: FailureReason::NoItems,
                    });
                }
                Err(err) => {
                    debug!(source_id = source.id(), %err, "failed to parse document");
                    let detail = match err {
                        XmlError::Malformed(msg) => msg,
                        other => other.to_string(),
                    };
                    failures.push(DocumentFailure {
                        source_id: source.id().to_owned(),
                        reason: FailureReason::Malformed(detail),
                    });
                }
            }
        }

        // Column-wide normalization: parse the emission timestamps in
        // one place and keep every line total consistent.
        for record in &mut records {
            record.emitted_at = record.emitted_at_text.as_deref().and_then(parse_timestamp);
            record.recompute_total();
        }

        let empty_reason = records.is_empty().then_some(EmptyReason::NoUsableItems);

        info!(
            class = %self.class,
            total_discovered,
            contributing,
            failed = failures.len(),
            records = records.len(),
            "batch complete"
        );

        BatchReport {
            class: self.class,
            records,
            total_discovered,
            contributing,
            failures,
            degraded_fields,
            empty_reason,
        }
    }
}

/// Best-effort timestamp parsing.
///
/// NF-e `dhEmi` is RFC 3339 with a UTC offset; older layouts emit a
/// naive datetime or a bare date. Anything else stays unparsed.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed);
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc().fixed_offset());
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().fixed_offset());
    }

    None
}
