//! Integration tests for the reporting service
//!
//! Rendering is replaced by recording fakes so the tests can observe
//! exactly what reaches the render dispatcher and the output sink.

use chrono::{NaiveDate, NaiveDateTime};
use label_text::{MessageCatalog, TranslateError, TranslationGateway};
use pretty_assertions::assert_eq;
use report_export::{ExportError, ExportFormat, LayoutDispatcher, PrintJob, RenderDispatcher};
use report_service::{
    AdHocRequest, BufferedResponse, ErrorKind, ReportRequest, ReportingService, ServiceConfig,
    ServiceError,
};
use report_template::{
    InMemoryImageStore, InMemoryRepository, ParameterSet, RecordSource, ReportError,
    TemplateHandle, Value,
};
use std::io::Write;
use std::sync::{Arc, Mutex};

const DESCRIPTORS: &str = r#"[
    {
        "id": 1,
        "name": "Invoice",
        "fields": [{ "name": "clientName" }],
        "tables": [{ "name": "items" }],
        "locales": [{ "id": 100, "value": "en" }, { "id": 101, "value": "ar" }]
    },
    {
        "id": 2,
        "name": "Customer Card",
        "locales": [{ "id": 200, "value": "en" }, { "id": 201, "value": "ar" }]
    }
]"#;

const INVOICE_REQUEST: &str = r#"{
    "reportId": 1,
    "locale": "EN",
    "data": { "clientName": "Acme", "items": [{ "sku": "A1", "qty": 2 }] }
}"#;

fn fixed_clock() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 9)
        .unwrap()
        .and_hms_opt(14, 30, 5)
        .unwrap()
}

/// Records render calls and exports a short marker
#[derive(Default)]
struct RecordingDispatcher {
    calls: Mutex<Vec<(TemplateHandle, ParameterSet)>>,
    fail_export: bool,
}

impl RecordingDispatcher {
    fn failing_export() -> Self {
        Self {
            fail_export: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<(TemplateHandle, ParameterSet)> {
        self.calls.lock().unwrap().clone()
    }
}

impl RenderDispatcher for RecordingDispatcher {
    fn render(
        &self,
        handle: TemplateHandle,
        parameters: &ParameterSet,
        data_source: &RecordSource,
    ) -> report_export::Result<PrintJob> {
        assert!(data_source.is_empty());
        self.calls
            .lock()
            .unwrap()
            .push((handle, parameters.clone()));
        Ok(PrintJob {
            title: format!("job-{handle}"),
            page_width: 100.0,
            page_height: 100.0,
            pages: Vec::new(),
        })
    }

    fn export(
        &self,
        format: ExportFormat,
        job: &PrintJob,
        out: &mut dyn Write,
    ) -> report_export::Result<()> {
        out.write_all(format!("{format}:{}", job.title).as_bytes())?;
        if self.fail_export {
            return Err(ExportError::BindingError("export failed midway".to_string()));
        }
        Ok(())
    }

    fn supported_formats(&self) -> &[ExportFormat] {
        &[ExportFormat::Pdf, ExportFormat::Docx]
    }
}

#[derive(Default)]
struct RecordingGateway {
    calls: Mutex<Vec<(String, String, String)>>,
}

impl TranslationGateway for RecordingGateway {
    fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, TranslateError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), from.to_string(), to.to_string()));
        Ok(format!("<{text}>"))
    }
}

fn service(dispatcher: Arc<RecordingDispatcher>) -> ReportingService {
    let repository = InMemoryRepository::from_json(DESCRIPTORS).unwrap();
    ReportingService::new(
        Arc::new(repository),
        Arc::new(InMemoryImageStore::new()),
        dispatcher,
    )
    .with_clock(fixed_clock)
}

#[test]
fn test_invoice_renders_against_en_handle() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let service = service(dispatcher.clone());
    let request = ReportRequest::from_json(INVOICE_REQUEST).unwrap();

    let mut response = BufferedResponse::new();
    let file_name = service
        .generate_report(&request, ExportFormat::Pdf, &mut response)
        .unwrap();

    assert_eq!(file_name, "report20240309023005.pdf");
    assert_eq!(
        response.content_disposition.as_deref(),
        Some("attachment; filename=report20240309023005.pdf")
    );
    assert_eq!(response.body, b"PDF:job-100");

    let calls = dispatcher.calls();
    assert_eq!(calls.len(), 1);
    let (handle, parameters) = &calls[0];
    assert_eq!(*handle, 100);
    assert_eq!(parameters.len(), 3);
    assert_eq!(
        parameters["title"].as_value(),
        Some(&Value::text("Invoice"))
    );
    assert_eq!(parameters["items"].as_records().unwrap().len(), 1);
}

#[test]
fn test_missing_field_stops_before_render() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let service = service(dispatcher.clone());
    let request = ReportRequest::from_json(
        r#"{ "reportId": 1, "locale": "en", "data": { "items": [] } }"#,
    )
    .unwrap();

    let mut response = BufferedResponse::new();
    let err = service
        .generate_report(&request, ExportFormat::Pdf, &mut response)
        .unwrap_err();

    assert!(matches!(
        &err,
        ServiceError::Report(ReportError::MissingOrInvalidEntry { entry, .. }) if entry == "clientName"
    ));
    assert_eq!(err.kind(), ErrorKind::Client);
    assert!(dispatcher.calls().is_empty());
    assert_eq!(response, BufferedResponse::new());
}

#[test]
fn test_unknown_report() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let service = service(dispatcher.clone());
    let request = ReportRequest::from_json(r#"{ "reportId": 42, "locale": "en" }"#).unwrap();

    let mut response = BufferedResponse::new();
    let err = service
        .generate_report(&request, ExportFormat::Pdf, &mut response)
        .unwrap_err();

    assert_eq!(err.to_string(), "No report found by id 42");
    assert_eq!(err.kind(), ErrorKind::Client);
    assert!(dispatcher.calls().is_empty());
}

#[test]
fn test_unsupported_locale() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let service = service(dispatcher.clone());
    let mut request = ReportRequest::from_json(INVOICE_REQUEST).unwrap();
    request.locale = "fr".to_string();

    let mut response = BufferedResponse::new();
    let err = service
        .generate_report(&request, ExportFormat::Pdf, &mut response)
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        r#"Locale 'fr' is not supported; supported locales: ["en", "ar"]"#
    );
    assert!(dispatcher.calls().is_empty());
    assert!(response.body.is_empty());
}

#[test]
fn test_unsupported_format_is_rejected_before_render() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let service = service(dispatcher.clone());
    let request = ReportRequest::from_json(INVOICE_REQUEST).unwrap();

    let mut response = BufferedResponse::new();
    let err = service
        .generate_report(&request, ExportFormat::Xlsx, &mut response)
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Export(ExportError::UnsupportedFormat {
            requested: ExportFormat::Xlsx,
            ..
        })
    ));
    assert_eq!(err.kind(), ErrorKind::Client);
    assert!(dispatcher.calls().is_empty());
}

#[test]
fn test_failed_export_writes_nothing() {
    let dispatcher = Arc::new(RecordingDispatcher::failing_export());
    let service = service(dispatcher.clone());
    let request = ReportRequest::from_json(INVOICE_REQUEST).unwrap();

    let mut response = BufferedResponse::new();
    let err = service
        .generate_report(&request, ExportFormat::Docx, &mut response)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Server);
    assert_eq!(dispatcher.calls().len(), 1);
    assert_eq!(response, BufferedResponse::new());
}

#[test]
fn test_adhoc_labels_and_parameters() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let gateway = Arc::new(RecordingGateway::default());
    let mut catalog = MessageCatalog::new();
    catalog.add_message("ar", "firstName", "الاسم الأول");

    let config = ServiceConfig {
        adhoc_report_id: Some(2),
        ..ServiceConfig::default()
    };
    let service = service(dispatcher.clone())
        .with_catalog(Arc::new(catalog))
        .with_gateway(gateway.clone())
        .with_config(config);

    let request =
        AdHocRequest::from_payload_json(r#"{ "firstName": "Sara", "lastName": "Ali" }"#, "ar")
            .unwrap();

    let mut response = BufferedResponse::new();
    service
        .generate_adhoc_report(&request, ExportFormat::Pdf, &mut response)
        .unwrap();

    let calls = dispatcher.calls();
    let (handle, parameters) = &calls[0];
    assert_eq!(*handle, 201);
    assert_eq!(
        parameters["title"].as_value(),
        Some(&Value::text("Customer Card"))
    );

    let labels = parameters["invoiceDataSource"].as_records().unwrap();
    assert_eq!(labels.field(0, "name"), Some(&Value::text("الاسم الأول")));
    assert_eq!(labels.field(1, "name"), Some(&Value::text("<last Name>")));
    assert_eq!(labels.field(1, "value"), Some(&Value::text("Ali")));

    assert_eq!(
        *gateway.calls.lock().unwrap(),
        vec![("last Name".to_string(), "en".to_string(), "ar".to_string())]
    );
}

#[test]
fn test_adhoc_without_governing_report() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let service = service(dispatcher.clone());
    let request = AdHocRequest::from_payload_json(r#"{ "a": 1 }"#, "en").unwrap();

    let mut response = BufferedResponse::new();
    let err = service
        .generate_adhoc_report(&request, ExportFormat::Pdf, &mut response)
        .unwrap_err();

    assert!(matches!(err, ServiceError::Config(_)));
    assert_eq!(err.kind(), ErrorKind::Server);
}

#[test]
fn test_end_to_end_csv_with_layout_dispatcher() {
    let mut dispatcher = LayoutDispatcher::new();
    dispatcher
        .register_json(
            100,
            r#"{ "blocks": [
                { "type": "text", "bind": "$.title", "position": { "x": 40, "y": 20 } },
                { "type": "text", "bind": "$.clientName", "position": { "x": 40, "y": 40 } },
                {
                    "type": "table",
                    "bind": "$.items",
                    "position": { "x": 40, "y": 60 },
                    "columns": [
                        { "field": "sku", "title": "SKU", "x": 0 },
                        { "field": "qty", "title": "Qty", "x": 100 }
                    ]
                }
            ] }"#,
        )
        .unwrap();

    let repository = InMemoryRepository::from_json(DESCRIPTORS).unwrap();
    let service = ReportingService::new(
        Arc::new(repository),
        Arc::new(InMemoryImageStore::new()),
        Arc::new(dispatcher),
    )
    .with_clock(fixed_clock)
    .with_config(ServiceConfig {
        file_prefix: "test".to_string(),
        ..ServiceConfig::default()
    });

    let request = ReportRequest::from_json(INVOICE_REQUEST).unwrap();
    let mut response = BufferedResponse::new();
    service
        .generate_report(&request, ExportFormat::Csv, &mut response)
        .unwrap();

    assert_eq!(response.file_name(), Some("test20240309023005.csv"));
    assert_eq!(
        String::from_utf8(response.body).unwrap(),
        "Invoice\nAcme\nSKU,Qty\nA1,2\n"
    );
}

#[test]
fn test_concurrent_requests_share_one_service() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let service = Arc::new(service(dispatcher.clone()));
    let request = ReportRequest::from_json(INVOICE_REQUEST).unwrap();

    std::thread::scope(|scope| {
        for _ in 0..8 {
            let service = Arc::clone(&service);
            let request = &request;
            scope.spawn(move || {
                let mut response = BufferedResponse::new();
                service
                    .generate_report(request, ExportFormat::Pdf, &mut response)
                    .unwrap();
                assert_eq!(response.body, b"PDF:job-100");
            });
        }
    });

    let calls = dispatcher.calls();
    assert_eq!(calls.len(), 8);
    assert!(calls.windows(2).all(|pair| pair[0] == pair[1]));
}
