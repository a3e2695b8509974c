//! Report Export - render dispatch and document export
//!
//! This crate provides:
//! - The render dispatcher interface consumed by the reporting service
//! - Compiled page layouts (JSON) bound to resolved parameter sets
//! - A layout dispatcher that fills layouts into print jobs
//! - Print job export to PDF, CSV and JSON, with optional embedded TrueType fonts
//!
//! # Example
//!
//! ```ignore
//! use report_export::{ExportFormat, LayoutDispatcher, RenderDispatcher};
//! use report_template::RecordSource;
//!
//! let mut dispatcher = LayoutDispatcher::new();
//! dispatcher.register_json(100, layout_json)?;
//! let job = dispatcher.render(100, &parameters, &RecordSource::empty())?;
//! let mut out = Vec::new();
//! dispatcher.export(ExportFormat::Pdf, &job, &mut out)?;
//! ```

mod binding;
mod csv;
mod dispatcher;
mod font;
mod layout;
mod pdf;

pub use binding::{resolve_binding, Bound};
pub use dispatcher::{Element, ImageElement, LayoutDispatcher, Page, PrintJob, RenderDispatcher, TextElement};
pub use font::{EmbeddedFont, FontSubset};
pub use layout::*;

use report_template::TemplateHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during rendering or export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Export format {requested} is not supported; supported formats: {supported:?}")]
    UnsupportedFormat {
        requested: ExportFormat,
        supported: Vec<ExportFormat>,
    },

    #[error("Unknown export format: {0}")]
    UnknownFormat(String),

    #[error("No compiled template for handle {0}")]
    UnknownTemplate(TemplateHandle),

    #[error("Failed to parse layout: {0}")]
    ParseError(String),

    #[error("Invalid data binding: {0}")]
    BindingError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("Font error: {0}")]
    FontError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Output document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExportFormat {
    Pdf,
    Csv,
    Json,
    Docx,
    Xlsx,
}

impl ExportFormat {
    /// Every known format
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Pdf,
        ExportFormat::Csv,
        ExportFormat::Json,
        ExportFormat::Docx,
        ExportFormat::Xlsx,
    ];

    /// File extension (lower-cased format name)
    pub fn extension(&self) -> String {
        self.to_string().to_lowercase()
    }

    /// MIME type of the exported document
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Pdf => "PDF",
            ExportFormat::Csv => "CSV",
            ExportFormat::Json => "JSON",
            ExportFormat::Docx => "DOCX",
            ExportFormat::Xlsx => "XLSX",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        ExportFormat::ALL
            .into_iter()
            .find(|f| f.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ExportError::UnknownFormat(s.to_string()))
    }
}
