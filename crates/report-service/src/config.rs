//! Service configuration

use crate::{Result, ServiceError};
use label_text::{HttpTranslator, PassthroughTranslator, TranslationGateway};
use report_export::EmbeddedFont;
use report_template::ReportId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Reporting service settings
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Language the payload keys are written in
    pub default_language: String,

    /// Leading part of generated file names
    pub file_prefix: String,

    /// Payload key and parameter name of the document title
    pub title_parameter: String,

    /// Parameter carrying the ad-hoc label records
    pub adhoc_source_parameter: String,

    /// Report governing ad-hoc requests that name none
    pub adhoc_report_id: Option<ReportId>,

    /// Translation request timeout in seconds
    pub translation_timeout_secs: u64,

    /// Translation service URL; labels are not translated if absent
    pub translation_endpoint: Option<String>,

    /// TrueType font embedded for PDF text; Helvetica (Latin-1 only) if absent
    pub pdf_font: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            file_prefix: "report".to_string(),
            title_parameter: report_template::TITLE_PARAMETER.to_string(),
            adhoc_source_parameter: "invoiceDataSource".to_string(),
            adhoc_report_id: None,
            translation_timeout_secs: 10,
            translation_endpoint: None,
            pdf_font: None,
        }
    }
}

impl ServiceConfig {
    /// Parse configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ServiceError::Config(e.to_string()))
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ServiceError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Translation request timeout
    pub fn translation_timeout(&self) -> Duration {
        Duration::from_secs(self.translation_timeout_secs)
    }

    /// Load the configured PDF font, relative paths resolved against `base`
    pub fn load_pdf_font(&self, base: &Path) -> Result<Option<EmbeddedFont>> {
        let Some(path) = &self.pdf_font else {
            return Ok(None);
        };
        let font = EmbeddedFont::from_file(base.join(path))?;
        Ok(Some(font))
    }

    /// Build the translation gateway this configuration describes
    pub fn translation_gateway(&self) -> Result<Arc<dyn TranslationGateway>> {
        match &self.translation_endpoint {
            Some(endpoint) => {
                let translator = HttpTranslator::new(endpoint.as_str(), self.translation_timeout())
                    .map_err(|e| ServiceError::Config(e.to_string()))?;
                Ok(Arc::new(translator))
            }
            None => Ok(Arc::new(PassthroughTranslator)),
        }
    }
}
