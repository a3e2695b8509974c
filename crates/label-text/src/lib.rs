//! Label Text - human-readable labels for report fields
//!
//! This crate provides:
//! - Camel-case identifier splitting (`clientName` -> `client Name`)
//! - Message catalogs loaded from `.properties` files, keyed by locale
//! - A translation gateway interface with an HTTP client implementation
//!
//! # Example
//!
//! ```ignore
//! use label_text::{break_camel, MessageCatalog, MessageSource};
//!
//! let mut catalog = MessageCatalog::new();
//! catalog.load_properties("en", "firstName=First Name".as_bytes())?;
//! assert_eq!(catalog.get_message("firstName", "en"), Some("First Name".to_string()));
//!
//! assert_eq!(break_camel("invoiceNumber"), "invoice Number");
//! ```

mod camel;
mod catalog;
mod translate;

pub use camel::{break_camel, is_word_boundary};
pub use catalog::{normalize_locale, MessageCatalog, MessageSource};
pub use translate::{HttpTranslator, PassthroughTranslator, TranslateError, TranslationGateway};

use thiserror::Error;

/// Errors that can occur while loading label resources
#[derive(Debug, Error)]
pub enum LabelTextError {
    #[error("Failed to load message catalog: {0}")]
    CatalogLoadError(String),

    #[error("Invalid properties bundle: {0}")]
    PropertiesSyntax(#[from] java_properties::PropertiesError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for label resource operations
pub type Result<T> = std::result::Result<T, LabelTextError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_break_camel_reexport() {
        assert_eq!(break_camel("clientName"), "client Name");
    }

    #[test]
    fn test_catalog_roundtrip_through_trait() {
        let mut catalog = MessageCatalog::new();
        catalog.add_message("en", "total", "Total");
        let source: &dyn MessageSource = &catalog;
        assert_eq!(source.get_message("total", "en"), Some("Total".to_string()));
    }
}
