//! Core library for NF-e fiscal XML analysis.
//!
//! This crate provides:
//! - Namespace-tolerant line-item extraction from NF-e/NFC-e documents
//! - Batch processing with per-document failure isolation
//! - Per-product aggregation (sums, means, dominant CFOP)
//! - Fixed CFOP business counters

pub mod aggregate;
pub mod batch;
pub mod error;
pub mod models;
pub mod xml;

pub use aggregate::{count_matching_cfops, summarize_products};
pub use batch::{parse_timestamp, BatchProcessor, DocumentSource, InMemoryDocument};
pub use error::{NfexError, Result, XmlError};
pub use models::{
    BatchReport, DocumentClass, DocumentFailure, EmptyReason, FailureReason, LineItem,
    ProductSummary,
};
pub use xml::{ItemExtractor, NFE_NAMESPACE};
