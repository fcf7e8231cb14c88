//! Error types for slide import.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can abort an import operation.
#[derive(Error, Debug)]
pub enum Error {
    /// The source text file does not exist.
    #[error("The selected file no longer exists: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Failed to open or read the source text file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The document host could not be acquired or failed while slides were
    /// being added.
    #[error("Import failed: {0}")]
    ImportFailed(#[source] HostError),

    /// `begin_import` was called while another import was still in flight.
    #[error("An import is already in progress")]
    SessionBusy,

    /// ZIP archive error (for PPTX packages).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML writing or parsing error (for PPTX packages).
    #[error("XML error: {0}")]
    XmlError(String),
}

/// Failures reported by a document host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// No host instance could be started.
    #[error("Document host unavailable: {0}")]
    Unavailable(String),

    /// A call into the host failed.
    #[error("Document host communication error: {0}")]
    Communication(String),

    /// The instance handle does not refer to a running host instance.
    #[error("Unknown or closed host instance #{0}")]
    UnknownInstance(u64),

    /// The document handle does not refer to an open document.
    #[error("Unknown or closed document #{0}")]
    UnknownDocument(u64),

    /// Writing the document to disk failed.
    #[error("Failed to save to {}: {message}", .path.display())]
    Save { path: PathBuf, message: String },
}

/// Result alias for document host calls.
pub type HostResult<T> = std::result::Result<T, HostError>;
