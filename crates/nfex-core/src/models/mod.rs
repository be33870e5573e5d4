//! Data models for extracted fiscal-document records.

pub mod batch;
pub mod record;
pub mod summary;

pub use batch::{BatchReport, DocumentFailure, EmptyReason, FailureReason};
pub use record::{DocumentClass, LineItem};
pub use summary::ProductSummary;
