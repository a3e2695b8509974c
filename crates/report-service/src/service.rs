//! Report generation orchestration

use crate::naming::{content_disposition, file_name};
use crate::{OutputSink, Result, ServiceConfig, ServiceError};
use chrono::{Local, NaiveDateTime};
use label_text::{MessageCatalog, MessageSource, PassthroughTranslator, TranslationGateway};
use report_export::{ExportError, ExportFormat, RenderDispatcher};
use report_template::{
    parse_payload, resolve_locale, AdHocResolver, ImageStore, Parameter, ParameterResolver,
    ParameterSet, Payload, RecordSource, ReportError, ReportId, TemplateDescriptor,
    TemplateHandle, TemplateRepository, Value,
};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info};

/// Structured report request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub report_id: ReportId,
    pub locale: String,
    #[serde(default)]
    pub data: Payload,
}

impl ReportRequest {
    /// Parse a request from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ServiceError::Report(ReportError::ParseError(e.to_string())))
    }
}

/// Ad-hoc request: free-form key/value data without declarations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdHocRequest {
    pub payload: Payload,
    pub language: String,
    /// Report whose layout and images are used; falls back to configuration
    #[serde(default)]
    pub report_id: Option<ReportId>,
}

impl AdHocRequest {
    /// Build a request from a raw JSON object payload
    pub fn from_payload_json(json: &str, language: impl Into<String>) -> Result<Self> {
        let payload = parse_payload(json).map_err(malformed_source)?;
        Ok(Self {
            payload,
            language: language.into(),
            report_id: None,
        })
    }

    /// Parse a full request (`payload`, `language`, optional `reportId`)
    ///
    /// A payload that is not a JSON object is a malformed data source.
    pub fn from_json(json: &str) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Envelope {
            payload: serde_json::Value,
            language: String,
            #[serde(default)]
            report_id: Option<ReportId>,
        }

        let envelope: Envelope = serde_json::from_str(json)
            .map_err(|e| ServiceError::Report(ReportError::ParseError(e.to_string())))?;
        let payload = serde_json::from_value(envelope.payload)
            .map_err(|e| ReportError::MalformedAdHocDataSource(e.to_string()))?;

        Ok(Self {
            payload,
            language: envelope.language,
            report_id: envelope.report_id,
        })
    }
}

fn malformed_source(err: ReportError) -> ReportError {
    match err {
        ReportError::ParseError(msg) => ReportError::MalformedAdHocDataSource(msg),
        other => other,
    }
}

/// Entry point tying lookup, resolution, rendering and export together
///
/// All collaborators are shared read-only, so one service can serve
/// concurrent requests from behind an `Arc`.
pub struct ReportingService {
    repository: Arc<dyn TemplateRepository>,
    images: Arc<dyn ImageStore>,
    catalog: Arc<dyn MessageSource>,
    gateway: Arc<dyn TranslationGateway>,
    dispatcher: Arc<dyn RenderDispatcher>,
    config: ServiceConfig,
    clock: fn() -> NaiveDateTime,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl ReportingService {
    /// Create a service with an empty catalog and no translation
    pub fn new(
        repository: Arc<dyn TemplateRepository>,
        images: Arc<dyn ImageStore>,
        dispatcher: Arc<dyn RenderDispatcher>,
    ) -> Self {
        Self {
            repository,
            images,
            catalog: Arc::new(MessageCatalog::new()),
            gateway: Arc::new(PassthroughTranslator),
            dispatcher,
            config: ServiceConfig::default(),
            clock: local_now,
        }
    }

    /// Set the message catalog used for ad-hoc labels
    pub fn with_catalog(mut self, catalog: Arc<dyn MessageSource>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Set the translation gateway used for ad-hoc labels
    pub fn with_gateway(mut self, gateway: Arc<dyn TranslationGateway>) -> Self {
        self.gateway = gateway;
        self
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the clock used for file names
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Current configuration
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn find_report(&self, id: ReportId) -> Result<Arc<TemplateDescriptor>> {
        self.repository
            .find_by_id(id)
            .ok_or_else(|| ReportError::ReportNotFound(id).into())
    }

    /// Resolve the parameter set for a structured request
    pub fn resolve_parameters(
        &self,
        descriptor: &TemplateDescriptor,
        data: &Payload,
    ) -> Result<ParameterSet> {
        let parameters = ParameterResolver::new(self.images.as_ref())
            .with_title_parameter(&self.config.title_parameter)
            .resolve(descriptor, data)?;
        Ok(parameters)
    }

    /// Resolve the parameter set for an ad-hoc request
    pub fn resolve_adhoc_parameters(
        &self,
        descriptor: &TemplateDescriptor,
        payload: &Payload,
        language: &str,
    ) -> Result<ParameterSet> {
        let labels = AdHocResolver::new(
            self.catalog.as_ref(),
            self.gateway.as_ref(),
            &self.config.default_language,
        )
        .resolve(payload, language)?;

        let images = ParameterResolver::new(self.images.as_ref()).resolve_images(descriptor)?;

        let mut parameters = ParameterSet::new();
        parameters.insert(
            self.config.title_parameter.clone(),
            Parameter::Value(Value::text(descriptor.name.clone())),
        );
        parameters.extend(images);
        parameters.insert(
            self.config.adhoc_source_parameter.clone(),
            Parameter::Records(labels),
        );
        Ok(parameters)
    }

    /// Generate a report from a structured request into `sink`
    ///
    /// Returns the generated file name. Nothing is written to the sink
    /// unless every step succeeds.
    pub fn generate_report(
        &self,
        request: &ReportRequest,
        format: ExportFormat,
        sink: &mut dyn OutputSink,
    ) -> Result<String> {
        info!(
            report_id = request.report_id,
            locale = %request.locale,
            %format,
            "Generating report"
        );

        let descriptor = self.find_report(request.report_id)?;
        let variant = resolve_locale(&descriptor, &request.locale)?;
        let parameters = self.resolve_parameters(&descriptor, &request.data)?;

        self.deliver(variant.id, &parameters, format, sink)
    }

    /// Generate a report from an ad-hoc request into `sink`
    pub fn generate_adhoc_report(
        &self,
        request: &AdHocRequest,
        format: ExportFormat,
        sink: &mut dyn OutputSink,
    ) -> Result<String> {
        let report_id = request
            .report_id
            .or(self.config.adhoc_report_id)
            .ok_or_else(|| {
                ServiceError::Config("no report configured for ad-hoc requests".to_string())
            })?;
        info!(
            report_id,
            language = %request.language,
            entries = request.payload.len(),
            %format,
            "Generating ad-hoc report"
        );

        let descriptor = self.find_report(report_id)?;
        let variant = resolve_locale(&descriptor, &request.language)?;
        let parameters =
            self.resolve_adhoc_parameters(&descriptor, &request.payload, &request.language)?;

        self.deliver(variant.id, &parameters, format, sink)
    }

    /// Render, export to a buffer, then hand the bytes to the sink
    fn deliver(
        &self,
        handle: TemplateHandle,
        parameters: &ParameterSet,
        format: ExportFormat,
        sink: &mut dyn OutputSink,
    ) -> Result<String> {
        if !self.dispatcher.supports(format) {
            return Err(ExportError::UnsupportedFormat {
                requested: format,
                supported: self.dispatcher.supported_formats().to_vec(),
            }
            .into());
        }

        let job = self
            .dispatcher
            .render(handle, parameters, &RecordSource::empty())?;
        let mut buffer = Vec::new();
        self.dispatcher.export(format, &job, &mut buffer)?;
        debug!(handle, bytes = buffer.len(), "Exported print job");

        let name = file_name(&self.config.file_prefix, format, (self.clock)());
        info!(file_name = %name, "Report ready");

        sink.set_content_disposition(&content_disposition(&name));
        sink.write_all(&buffer)?;
        sink.flush()?;
        Ok(name)
    }
}
