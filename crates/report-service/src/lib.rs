//! Report Service - report generation facade
//!
//! This crate provides:
//! - Structured and ad-hoc report requests
//! - Orchestration: template lookup, locale selection, parameter
//!   resolution, rendering and export
//! - Attachment file naming and output sinks
//! - Service configuration
//!
//! # Example
//!
//! ```ignore
//! use report_service::{BufferedResponse, ReportRequest, ReportingService};
//! use report_export::ExportFormat;
//!
//! let service = ReportingService::new(repository, images, dispatcher);
//! let request = ReportRequest::from_json(request_json)?;
//! let mut response = BufferedResponse::new();
//! let file_name = service.generate_report(&request, ExportFormat::Pdf, &mut response)?;
//! ```

mod config;
mod naming;
mod service;
mod sink;

pub use config::ServiceConfig;
pub use naming::{content_disposition, file_name};
pub use service::{AdHocRequest, ReportRequest, ReportingService};
pub use sink::{BufferedResponse, OutputSink};

use report_export::ExportError;
use report_template::ReportError;
use thiserror::Error;

/// Errors surfaced to callers of the reporting service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Who is at fault for a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is wrong and retrying it unchanged will fail again
    Client,
    /// Anything else
    Server,
}

impl ServiceError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Report(
                ReportError::ReportNotFound(_)
                | ReportError::UnsupportedLocale { .. }
                | ReportError::MissingOrInvalidEntry { .. }
                | ReportError::MalformedAdHocDataSource(_)
                | ReportError::ParseError(_),
            )
            | ServiceError::Export(
                ExportError::UnsupportedFormat { .. } | ExportError::UnknownFormat(_),
            ) => ErrorKind::Client,
            _ => ErrorKind::Server,
        }
    }
}

/// Result type for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;
