//! Export payloads, format encoders, and the artifact writer.

pub mod formats;
mod payload;
mod types;
mod writer;

use thiserror::Error;

pub use payload::{ExportAnnotation, ExportImage, ExportPayload, UnifiedClass};
pub use types::{ExportFormat, FormatChoice, TaskType};
pub use writer::{ExportArtifactWriter, WriteRequest};

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Filesystem operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// COCO document serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Pascal VOC document generation failed.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An unrecognized format tag was supplied.
    #[error("Invalid export format: {0}")]
    InvalidFormat(String),

    /// Staging or relocation failed.
    #[error("Filesystem error: {0}")]
    Filesystem(String),
}
