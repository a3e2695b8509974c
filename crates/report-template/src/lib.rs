//! Report Template - descriptors and parameter resolution
//!
//! This crate provides:
//! - Template descriptor types (fields, tables, images, locale variants)
//! - Dynamically shaped request payload values
//! - Locale variant resolution
//! - Structured parameter resolution against a descriptor
//! - Ad-hoc label resolution (catalog, camel-case split, translation)
//! - Repository and image store interfaces with in-memory implementations
//!
//! # Example
//!
//! ```ignore
//! use report_template::{parse_descriptor, parse_payload, resolve_locale, ParameterResolver};
//!
//! let descriptor = parse_descriptor(descriptor_json)?;
//! let variant = resolve_locale(&descriptor, "EN")?;
//! let payload = parse_payload(data_json)?;
//! let parameters = ParameterResolver::new(&images).resolve(&descriptor, &payload)?;
//! ```

pub mod adhoc;
mod images;
mod locale;
mod parameters;
mod repository;
mod resolver;
mod schema;
mod value;

pub use adhoc::{AdHocResolver, Label, LabelSource};
pub use images::{ImageResource, ImageStore, InMemoryImageStore};
pub use locale::resolve_locale;
pub use parameters::{Parameter, ParameterSet, RecordSource};
pub use repository::{InMemoryRepository, TemplateRepository};
pub use resolver::{ParameterResolver, TITLE_PARAMETER};
pub use schema::*;
pub use value::{parse_payload, value_to_string, Payload, Record, Scalar, Value};

use thiserror::Error;

/// Errors that can occur while resolving report parameters
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("No report found by id {0}")]
    ReportNotFound(ReportId),

    #[error("Locale '{requested}' is not supported; supported locales: {supported:?}")]
    UnsupportedLocale {
        requested: String,
        supported: Vec<String>,
    },

    #[error("Missing or invalid {kind} '{entry}' for report {report}: {reason}")]
    MissingOrInvalidEntry {
        entry: String,
        kind: EntryKind,
        report: ReportContext,
        reason: String,
    },

    #[error("Malformed ad-hoc data source: {0}")]
    MalformedAdHocDataSource(String),

    #[error("Translation failed: {0}")]
    Translation(#[from] label_text::TranslateError),

    #[error("Failed to parse: {0}")]
    ParseError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ReportError {
    /// Name of the offending declaration, if this is an entry error
    pub fn entry(&self) -> Option<&str> {
        match self {
            ReportError::MissingOrInvalidEntry { entry, .. } => Some(entry),
            _ => None,
        }
    }
}

/// Result type for report operations
pub type Result<T> = std::result::Result<T, ReportError>;
