//! Resolved parameter set handed to the renderer

use crate::{ImageResource, Record, Value};
use indexmap::IndexMap;
use std::sync::Arc;

/// Data-source adapter over a sequence of records
///
/// Feeds repeating regions (tables) of a compiled template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSource {
    records: Vec<Record>,
}

impl RecordSource {
    /// Wrap a sequence of records
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// A source with no records
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if there are no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in order
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Get a record by index
    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// Get a field of a record
    pub fn field(&self, index: usize, name: &str) -> Option<&Value> {
        self.records.get(index).and_then(|r| r.get(name))
    }

    /// Borrow the underlying records
    pub fn records(&self) -> &[Record] {
        &self.records
    }
}

impl FromIterator<Record> for RecordSource {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A single resolved parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    /// Value forwarded as-is from the payload (or the title)
    Value(Value),
    /// Sequence-of-records adapter
    Records(RecordSource),
    /// Pre-loaded image
    Image(Arc<ImageResource>),
}

impl Parameter {
    /// Get the value if this is a plain value
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Parameter::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Get the record source if this is a table
    pub fn as_records(&self) -> Option<&RecordSource> {
        match self {
            Parameter::Records(r) => Some(r),
            _ => None,
        }
    }

    /// Get the image if this is an image
    pub fn as_image(&self) -> Option<&ImageResource> {
        match self {
            Parameter::Image(i) => Some(i),
            _ => None,
        }
    }
}

/// Parameter name -> parameter, in insertion order
pub type ParameterSet = IndexMap<String, Parameter>;
