//! Error types for pdfium-session

use crate::stream::StreamId;
use pdfium_sys::{FPDF_ERR_FORMAT, FPDF_ERR_PASSWORD, FPDF_ERR_SECURITY};
use thiserror::Error;

/// Result type for pdfium-session operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Why the engine refused to open a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFailure {
    /// Password missing or wrong.
    BadPassword,
    /// Not a PDF, or damaged beyond repair.
    CorruptFormat,
    /// Encrypted with a security handler the engine does not support.
    UnsupportedSecurity,
    /// Anything else, including read failures through the stream bridge.
    Unknown,
}

impl OpenFailure {
    /// Translate a native last-error code.
    pub fn from_last_error(code: u32) -> Self {
        match code {
            FPDF_ERR_PASSWORD => OpenFailure::BadPassword,
            FPDF_ERR_FORMAT => OpenFailure::CorruptFormat,
            FPDF_ERR_SECURITY => OpenFailure::UnsupportedSecurity,
            _ => OpenFailure::Unknown,
        }
    }
}

impl std::fmt::Display for OpenFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            OpenFailure::BadPassword => "incorrect password",
            OpenFailure::CorruptFormat => "corrupt or unsupported file format",
            OpenFailure::UnsupportedSecurity => "unsupported security handler",
            OpenFailure::Unknown => "unknown error",
        };
        f.write_str(text)
    }
}

/// Error types for PDF operations
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open PDF document
    #[error("Failed to open PDF document: {kind} (PDFium error code {code})")]
    OpenFailed { kind: OpenFailure, code: u32 },

    /// Failed to load page
    #[error("Failed to load page {index}")]
    PageLoadFailed { index: usize },

    /// Operation attempted after the document was closed
    #[error("Document has been closed")]
    Disposed,

    /// A stream callback referenced an id that is no longer registered
    #[error("Stream {id} is not registered")]
    StreamUnregistered { id: StreamId },

    /// Failed to render page
    #[error("Failed to render page: {reason}")]
    RenderFailed { reason: String },

    /// Failed to save document
    #[error("Failed to save document: {reason}")]
    SaveFailed { reason: String },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PdfError {
    /// Build the open error for a native last-error code.
    pub(crate) fn open_failed(code: u32) -> Self {
        PdfError::OpenFailed {
            kind: OpenFailure::from_last_error(code),
            code,
        }
    }
}
