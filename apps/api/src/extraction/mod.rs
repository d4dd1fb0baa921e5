//! Text Extractor: turns an uploaded PDF into one linear text stream.
//!
//! Extraction failure is a data-quality condition, not a fault: callers get an
//! `ExtractionError` they are expected to downgrade to empty text plus a diagnostic.
//!
//! `pdf-extract` is CPU-bound and can panic on malformed input, so the pipeline runs
//! extractors inside `tokio::task::spawn_blocking`; a panic surfaces as a join error.

pub mod pdf;

use thiserror::Error;

use crate::models::Document;

pub use pdf::PdfTextExtractor;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("document is empty (0 bytes)")]
    Empty,

    #[error("PDF could not be parsed: {0}")]
    Parse(String),

    #[error("scratch file error: {0}")]
    Scratch(#[from] std::io::Error),
}

/// Anything that can turn a `Document` into text.
///
/// Implementations must be cheap to share (`Arc<dyn TextExtractor>`) and free of
/// side effects beyond reading the input (and any scratch file they create and remove).
pub trait TextExtractor: Send + Sync {
    fn extract(&self, document: &Document) -> Result<String, ExtractionError>;
}
