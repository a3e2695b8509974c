//! Template metadata repository

use crate::{parse_descriptors, ReportId, Result, TemplateDescriptor};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Read-only source of template descriptors
pub trait TemplateRepository: Send + Sync {
    /// Find a descriptor by report id
    fn find_by_id(&self, id: ReportId) -> Option<Arc<TemplateDescriptor>>;
}

/// Repository held in memory, typically loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    descriptors: HashMap<ReportId, Arc<TemplateDescriptor>>,
}

impl InMemoryRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON array of descriptors
    pub fn from_json(json: &str) -> Result<Self> {
        let mut repository = Self::new();
        for descriptor in parse_descriptors(json)? {
            repository.insert(descriptor);
        }
        Ok(repository)
    }

    /// Build from a JSON file holding an array of descriptors
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            crate::ReportError::ParseError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Add or replace a descriptor
    pub fn insert(&mut self, descriptor: TemplateDescriptor) {
        self.descriptors.insert(descriptor.id, Arc::new(descriptor));
    }

    /// Number of descriptors
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Check if the repository is empty
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl TemplateRepository for InMemoryRepository {
    fn find_by_id(&self, id: ReportId) -> Option<Arc<TemplateDescriptor>> {
        self.descriptors.get(&id).cloned()
    }
}
