//! Template descriptor schema types

use crate::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Identifier of a report template
pub type ReportId = u64;

/// Identifier of a compiled template handle owned by the render dispatcher
pub type TemplateHandle = u64;

/// Identifier of a pre-loaded image resource
pub type ImageId = u64;

/// Metadata describing a report's expected input and its localized variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    /// Report identifier
    pub id: ReportId,

    /// Display name, used as the default document title
    pub name: String,

    /// First-level scalar fields
    #[serde(default)]
    pub fields: Vec<FieldDeclaration>,

    /// Repeating regions, each fed by a sequence of records
    #[serde(default)]
    pub tables: Vec<TableDeclaration>,

    /// Pre-loaded images injected by id
    #[serde(default)]
    pub images: Vec<ImageDeclaration>,

    /// Localized compiled variants
    #[serde(default)]
    pub locales: Vec<LocaleVariant>,
}

/// A first-level field the request must supply
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldDeclaration {
    /// Payload key and parameter name
    pub name: String,
}

/// A table the request must supply as a sequence of records
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableDeclaration {
    /// Payload key and parameter name
    pub name: String,
}

/// An image resolved from the image store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageDeclaration {
    /// Image store id
    pub id: ImageId,

    /// Parameter name
    pub name: String,
}

/// One localized, pre-compiled form of a template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocaleVariant {
    /// Compiled template handle id
    pub id: TemplateHandle,

    /// Locale tag (e.g. `en`, `ar`)
    pub value: String,
}

/// Kind of declaration an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Field,
    Table,
    Image,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryKind::Field => "field",
            EntryKind::Table => "table",
            EntryKind::Image => "image",
        })
    }
}

/// Report identity carried in errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportContext {
    pub id: ReportId,
    pub name: String,
}

impl fmt::Display for ReportContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} '{}'", self.id, self.name)
    }
}

impl TemplateDescriptor {
    /// Create an empty descriptor
    pub fn new(id: ReportId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            fields: Vec::new(),
            tables: Vec::new(),
            images: Vec::new(),
            locales: Vec::new(),
        }
    }

    /// Declare a field
    pub fn with_field(mut self, name: &str) -> Self {
        self.fields.push(FieldDeclaration {
            name: name.to_string(),
        });
        self
    }

    /// Declare a table
    pub fn with_table(mut self, name: &str) -> Self {
        self.tables.push(TableDeclaration {
            name: name.to_string(),
        });
        self
    }

    /// Declare an image
    pub fn with_image(mut self, id: ImageId, name: &str) -> Self {
        self.images.push(ImageDeclaration {
            id,
            name: name.to_string(),
        });
        self
    }

    /// Add a locale variant
    pub fn with_locale(mut self, value: &str, handle: TemplateHandle) -> Self {
        self.locales.push(LocaleVariant {
            id: handle,
            value: value.to_string(),
        });
        self
    }

    /// Supported locale tags, in declaration order
    pub fn locale_values(&self) -> Vec<String> {
        self.locales.iter().map(|l| l.value.clone()).collect()
    }

    /// Identity used in error messages
    pub fn context(&self) -> ReportContext {
        ReportContext {
            id: self.id,
            name: self.name.clone(),
        }
    }

    /// Check descriptor invariants
    ///
    /// Locale tags must be unique ignoring case, and every declaration needs a
    /// non-empty name.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for locale in &self.locales {
            if !seen.insert(locale.value.to_lowercase()) {
                return Err(ReportError::ParseError(format!(
                    "report {}: duplicate locale '{}'",
                    self.context(),
                    locale.value
                )));
            }
        }

        let names = self
            .fields
            .iter()
            .map(|f| (EntryKind::Field, f.name.as_str()))
            .chain(self.tables.iter().map(|t| (EntryKind::Table, t.name.as_str())))
            .chain(self.images.iter().map(|i| (EntryKind::Image, i.name.as_str())));

        for (kind, name) in names {
            if name.trim().is_empty() {
                return Err(ReportError::ParseError(format!(
                    "report {}: {kind} declaration has an empty name",
                    self.context()
                )));
            }
        }

        Ok(())
    }
}

/// Parse and validate a single descriptor from JSON
pub fn parse_descriptor(json: &str) -> Result<TemplateDescriptor> {
    let descriptor: TemplateDescriptor =
        serde_json::from_str(json).map_err(|e| ReportError::ParseError(e.to_string()))?;
    descriptor.validate()?;
    Ok(descriptor)
}

/// Parse and validate a JSON array of descriptors
pub fn parse_descriptors(json: &str) -> Result<Vec<TemplateDescriptor>> {
    let descriptors: Vec<TemplateDescriptor> =
        serde_json::from_str(json).map_err(|e| ReportError::ParseError(e.to_string()))?;
    for descriptor in &descriptors {
        descriptor.validate()?;
    }
    Ok(descriptors)
}
