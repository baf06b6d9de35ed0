//! Error types for the statex-core library.

use thiserror::Error;

/// Main error type for the statex library.
#[derive(Error, Debug)]
pub enum StatexError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// External classifier model error.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Translation error.
    #[error("translation error: {0}")]
    Translate(#[from] TranslateError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),

    /// A table detection profile could not be applied to a page.
    #[error("table detection failed: {0}")]
    TableDetection(String),
}

/// Errors raised by an externally supplied category model.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Failed to load the model.
    #[error("failed to load model: {0}")]
    Load(String),

    /// The model produced output that does not fit its declared shape.
    #[error("malformed model output: {0}")]
    Malformed(String),

    /// The model had no answer for the given text.
    #[error("no prediction for input")]
    NoPrediction,
}

/// Errors raised by a translation backend.
#[derive(Error, Debug)]
pub enum TranslateError {
    /// The backend is unavailable.
    #[error("translator unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected or failed on the input.
    #[error("translation failed: {0}")]
    Failed(String),
}

/// Result type for the statex library.
pub type Result<T> = std::result::Result<T, StatexError>;
