//! Structured parameter resolution

use crate::parameters::{Parameter, ParameterSet, RecordSource};
use crate::schema::*;
use crate::{ImageStore, Payload, ReportError, Result, Value};
use tracing::debug;

/// Payload key overriding the document title, and the parameter it lands in
pub const TITLE_PARAMETER: &str = "title";

type Resolved = Vec<(String, Parameter)>;

/// Resolves a request payload against a template descriptor
///
/// Tables, fields and images are resolved as three independent groups joined
/// before the set is assembled. Each group stops at its first failure. When
/// several groups fail, the reported error is the table error, else the field
/// error, else the image error; within a group it is the lowest declaration
/// index. The outcome is therefore the same on every run.
pub struct ParameterResolver<'a> {
    /// Pre-loaded images
    images: &'a dyn ImageStore,
    /// Parameter name for the document title
    title_parameter: &'a str,
}

impl<'a> ParameterResolver<'a> {
    /// Create a resolver over an image store
    pub fn new(images: &'a dyn ImageStore) -> Self {
        Self {
            images,
            title_parameter: TITLE_PARAMETER,
        }
    }

    /// Use a different title key/parameter name
    pub fn with_title_parameter(mut self, name: &'a str) -> Self {
        self.title_parameter = name;
        self
    }

    /// Resolve the full parameter set
    ///
    /// Either every declaration resolves or nothing is returned.
    pub fn resolve(&self, descriptor: &TemplateDescriptor, payload: &Payload) -> Result<ParameterSet> {
        let (tables, (fields, images)) = rayon::join(
            || self.resolve_tables(descriptor, payload),
            || {
                rayon::join(
                    || self.resolve_fields(descriptor, payload),
                    || self.resolve_images(descriptor),
                )
            },
        );

        let mut parameters = ParameterSet::new();
        parameters.insert(
            self.title_parameter.to_string(),
            Parameter::Value(self.resolve_title(descriptor, payload)),
        );
        parameters.extend(tables?);
        parameters.extend(fields?);
        parameters.extend(images?);

        debug!(
            report = descriptor.id,
            tables = descriptor.tables.len(),
            fields = descriptor.fields.len(),
            images = descriptor.images.len(),
            "resolved report parameters"
        );

        Ok(parameters)
    }

    /// Title override from the payload, else the descriptor name
    fn resolve_title(&self, descriptor: &TemplateDescriptor, payload: &Payload) -> Value {
        payload
            .get(self.title_parameter)
            .filter(|v| !v.is_null())
            .cloned()
            .unwrap_or_else(|| Value::text(&descriptor.name))
    }

    /// Resolve every table into a record source
    fn resolve_tables(&self, descriptor: &TemplateDescriptor, payload: &Payload) -> Result<Resolved> {
        descriptor
            .tables
            .iter()
            .map(|table| {
                let source = table_records(payload.get(&table.name)).map_err(|reason| {
                    missing(descriptor, &table.name, EntryKind::Table, reason)
                })?;
                Ok((table.name.clone(), Parameter::Records(source)))
            })
            .collect()
    }

    /// Resolve every field, accepting any present value as-is
    fn resolve_fields(&self, descriptor: &TemplateDescriptor, payload: &Payload) -> Result<Resolved> {
        descriptor
            .fields
            .iter()
            .map(|field| match payload.get(&field.name) {
                Some(value) if !value.is_null() => {
                    Ok((field.name.clone(), Parameter::Value(value.clone())))
                }
                _ => Err(missing(
                    descriptor,
                    &field.name,
                    EntryKind::Field,
                    "not present in request data".to_string(),
                )),
            })
            .collect()
    }

    /// Resolve every image declared by a descriptor from the store
    pub fn resolve_images(&self, descriptor: &TemplateDescriptor) -> Result<Vec<(String, Parameter)>> {
        descriptor
            .images
            .iter()
            .map(|image| {
                let resource = self.images.get(image.id).ok_or_else(|| {
                    missing(
                        descriptor,
                        &image.name,
                        EntryKind::Image,
                        format!("image id {} is not loaded", image.id),
                    )
                })?;
                Ok((image.name.clone(), Parameter::Image(resource)))
            })
            .collect()
    }
}

/// Check that a table entry is a sequence of records
fn table_records(value: Option<&Value>) -> std::result::Result<RecordSource, String> {
    let items = match value {
        None | Some(Value::Scalar(crate::Scalar::Null)) => {
            return Err("not present in request data".to_string())
        }
        Some(Value::Sequence(items)) => items,
        Some(other) => {
            return Err(format!(
                "expected a sequence of records, got a {}",
                other.shape()
            ))
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_record().cloned().ok_or_else(|| {
                format!("element {i} is a {}, expected a record", item.shape())
            })
        })
        .collect()
}

fn missing(
    descriptor: &TemplateDescriptor,
    entry: &str,
    kind: EntryKind,
    reason: String,
) -> ReportError {
    ReportError::MissingOrInvalidEntry {
        entry: entry.to_string(),
        kind,
        report: descriptor.context(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::tiny_png;
    use crate::{parse_payload, InMemoryImageStore};
    use pretty_assertions::assert_eq;

    fn store_with_logo() -> InMemoryImageStore {
        let mut store = InMemoryImageStore::new();
        store.insert_bytes(7, tiny_png(2, 2)).unwrap();
        store
    }

    fn invoice() -> TemplateDescriptor {
        TemplateDescriptor::new(1, "Invoice")
            .with_field("clientName")
            .with_field("total")
            .with_table("items")
            .with_image(7, "logo")
            .with_locale("en", 10)
    }

    #[test]
    fn test_resolve_complete_payload() {
        let store = store_with_logo();
        let payload = parse_payload(
            r#"{
                "clientName": "Acme",
                "total": 12.5,
                "items": [{ "sku": "A1", "qty": 2 }, { "sku": "B2", "qty": 1 }],
                "ignored": true
            }"#,
        )
        .unwrap();

        let parameters = ParameterResolver::new(&store).resolve(&invoice(), &payload).unwrap();

        let names: Vec<&str> = parameters.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["title", "items", "clientName", "total", "logo"]);
        assert_eq!(parameters["title"], Parameter::Value(Value::text("Invoice")));
        assert_eq!(parameters["clientName"], Parameter::Value(Value::text("Acme")));
        assert_eq!(parameters["total"], Parameter::Value(Value::from(12.5)));

        let items = parameters["items"].as_records().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items.field(1, "sku"), Some(&Value::text("B2")));

        assert_eq!(parameters["logo"].as_image().unwrap().id, 7);
    }

    #[test]
    fn test_title_override() {
        let store = InMemoryImageStore::new();
        let descriptor = TemplateDescriptor::new(1, "Invoice");
        let payload = parse_payload(r#"{ "title": "Proforma Invoice" }"#).unwrap();

        let parameters = ParameterResolver::new(&store).resolve(&descriptor, &payload).unwrap();
        assert_eq!(parameters["title"], Parameter::Value(Value::text("Proforma Invoice")));
    }

    #[test]
    fn test_null_title_falls_back() {
        let store = InMemoryImageStore::new();
        let descriptor = TemplateDescriptor::new(1, "Invoice");
        let payload = parse_payload(r#"{ "title": null }"#).unwrap();

        let parameters = ParameterResolver::new(&store).resolve(&descriptor, &payload).unwrap();
        assert_eq!(parameters["title"], Parameter::Value(Value::text("Invoice")));
    }

    #[test]
    fn test_custom_title_parameter() {
        let store = InMemoryImageStore::new();
        let descriptor = TemplateDescriptor::new(1, "Invoice");
        let payload = parse_payload(r#"{ "reportName": "Custom" }"#).unwrap();

        let parameters = ParameterResolver::new(&store)
            .with_title_parameter("reportName")
            .resolve(&descriptor, &payload)
            .unwrap();
        assert_eq!(parameters["reportName"], Parameter::Value(Value::text("Custom")));
        assert!(!parameters.contains_key("title"));
    }

    #[test]
    fn test_field_accepts_any_shape() {
        let store = InMemoryImageStore::new();
        let descriptor = TemplateDescriptor::new(1, "Invoice").with_field("address");
        let payload = parse_payload(r#"{ "address": { "city": "Cairo" } }"#).unwrap();

        let parameters = ParameterResolver::new(&store).resolve(&descriptor, &payload).unwrap();
        assert_eq!(parameters["address"].as_value().unwrap().shape(), "record");
    }

    #[test]
    fn test_null_field_is_missing() {
        let store = InMemoryImageStore::new();
        let descriptor = TemplateDescriptor::new(1, "Invoice").with_field("clientName");
        let payload = parse_payload(r#"{ "clientName": null }"#).unwrap();

        let err = ParameterResolver::new(&store).resolve(&descriptor, &payload).unwrap_err();
        assert_eq!(err.entry(), Some("clientName"));
    }

    #[test]
    fn test_table_wrong_shape() {
        let store = InMemoryImageStore::new();
        let descriptor = TemplateDescriptor::new(1, "Invoice").with_table("items");

        for (data, reason) in [
            (r#"{ "items": "A1" }"#, "expected a sequence of records, got a scalar"),
            (r#"{ "items": { "sku": "A1" } }"#, "expected a sequence of records, got a record"),
            (r#"{ "items": [{ "sku": "A1" }, 3] }"#, "element 1 is a scalar, expected a record"),
        ] {
            let payload = parse_payload(data).unwrap();
            match ParameterResolver::new(&store).resolve(&descriptor, &payload) {
                Err(ReportError::MissingOrInvalidEntry {
                    entry,
                    kind,
                    reason: got,
                    ..
                }) => {
                    assert_eq!(entry, "items");
                    assert_eq!(kind, EntryKind::Table);
                    assert_eq!(got, reason);
                }
                other => panic!("Expected MissingOrInvalidEntry, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_empty_table_is_valid() {
        let store = InMemoryImageStore::new();
        let descriptor = TemplateDescriptor::new(1, "Invoice").with_table("items");
        let payload = parse_payload(r#"{ "items": [] }"#).unwrap();

        let parameters = ParameterResolver::new(&store).resolve(&descriptor, &payload).unwrap();
        assert!(parameters["items"].as_records().unwrap().is_empty());
    }

    #[test]
    fn test_missing_image() {
        let store = InMemoryImageStore::new();
        let descriptor = TemplateDescriptor::new(1, "Invoice").with_image(99, "stamp");
        let payload = Payload::new();

        let err = ParameterResolver::new(&store).resolve(&descriptor, &payload).unwrap_err();
        assert_eq!(err.entry(), Some("stamp"));
        assert!(err.to_string().contains("image id 99 is not loaded"));
    }

    #[test]
    fn test_deterministic_failure_order() {
        let store = InMemoryImageStore::new();
        let descriptor = invoice();

        // Everything missing: the first table wins
        for _ in 0..20 {
            let err = ParameterResolver::new(&store)
                .resolve(&descriptor, &Payload::new())
                .unwrap_err();
            assert_eq!(err.entry(), Some("items"));
        }

        // Table present: the first declared field wins over the image
        let payload = parse_payload(r#"{ "items": [] }"#).unwrap();
        for _ in 0..20 {
            let err = ParameterResolver::new(&store).resolve(&descriptor, &payload).unwrap_err();
            assert_eq!(err.entry(), Some("clientName"));
        }

        // Fields present: the image is reported
        let payload =
            parse_payload(r#"{ "items": [], "clientName": "Acme", "total": 1 }"#).unwrap();
        let err = ParameterResolver::new(&store).resolve(&descriptor, &payload).unwrap_err();
        assert_eq!(err.entry(), Some("logo"));
    }

    #[test]
    fn test_error_carries_report_context() {
        let store = InMemoryImageStore::new();
        let err = ParameterResolver::new(&store)
            .resolve(&invoice(), &Payload::new())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing or invalid table 'items' for report #1 'Invoice': not present in request data"
        );
    }
}
