//! Error types for document operations.

use thiserror::Error;

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors that can occur while loading, saving or decorating a document.
///
/// None of these reach the caller of an intent; the controller logs them
/// where they occur.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Persisted JSON was malformed or had missing/mistyped fields.
    #[error("Decoding error: {0}")]
    Decoding(#[from] serde_json::Error),

    /// JSON parsed but violates a document invariant.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Reading or writing the autosave file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A background fetch could not be completed.
    #[error("Failed to fetch background: {0}")]
    Fetch(String),

    /// HTTP layer failed (connection, timeout, status).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Image bytes could not be decoded.
    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    /// The controller was created outside a Tokio runtime.
    #[error("No Tokio runtime available")]
    NoRuntime,
}
