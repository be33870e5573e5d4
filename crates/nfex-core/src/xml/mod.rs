//! XML document handling: a small namespace-aware tree and the
//! line-item extractor built on top of it.

pub mod extractor;
pub mod tree;

pub use extractor::{Extraction, ItemExtractor, NFE_NAMESPACE};
pub use tree::{parse_document, Element};
