//! Error types for the nfex-core library.

use thiserror::Error;

/// Main error type for the nfex library.
#[derive(Error, Debug)]
pub enum NfexError {
    /// XML document error.
    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to XML document parsing.
#[derive(Error, Debug)]
pub enum XmlError {
    /// The document markup is not well-formed.
    #[error("malformed XML: {0}")]
    Malformed(String),

    /// The document contains no root element.
    #[error("document has no root element")]
    NoRoot,
}

impl From<quick_xml::Error> for XmlError {
    fn from(err: quick_xml::Error) -> Self {
        XmlError::Malformed(err.to_string())
    }
}

/// Result type for the nfex library.
pub type Result<T> = std::result::Result<T, NfexError>;
