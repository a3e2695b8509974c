//! Ad-hoc label resolution
//!
//! Used when no descriptor governs the shape of the request: every payload
//! key becomes a `{name, value}` record whose name is a display label. Labels
//! come from an ordered chain of sources; each either finds a label or passes
//! to the next:
//!
//! 1. the message catalog, in the requested language
//! 2. for the default language, the camel-split key with a trailing `" :"`
//! 3. otherwise the camel-split key translated from the default language

use crate::{parse_payload, value_to_string, Payload, Record, RecordSource, ReportError, Result, Value};
use label_text::{normalize_locale, MessageSource, TranslationGateway};
use tracing::{debug, trace};

/// Outcome of one label source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    /// The source produced a label
    Found(String),
    /// The source has nothing; try the next one
    Next,
}

/// One link of the label chain
pub trait LabelSource: Send + Sync {
    /// Produce a label for `key` in `language`
    fn label(&self, key: &str, language: &str) -> Result<Label>;
}

/// Labels from the message catalog
struct CatalogLabels<'a> {
    catalog: &'a dyn MessageSource,
}

impl LabelSource for CatalogLabels<'_> {
    fn label(&self, key: &str, language: &str) -> Result<Label> {
        Ok(match self.catalog.get_message(key, language) {
            Some(message) => Label::Found(message),
            None => {
                trace!(key, language, "no catalog entry");
                Label::Next
            }
        })
    }
}

/// Camel-split labels, only for the default language
struct CamelLabels<'a> {
    gateway: &'a dyn TranslationGateway,
    default_language: &'a str,
}

impl LabelSource for CamelLabels<'_> {
    fn label(&self, key: &str, language: &str) -> Result<Label> {
        if !same_language(language, self.default_language) {
            return Ok(Label::Next);
        }
        Ok(Label::Found(format!("{} :", self.gateway.break_camel(key))))
    }
}

/// Camel-split labels translated into the requested language
///
/// Terminal link: it always produces a label or fails.
struct TranslatedLabels<'a> {
    gateway: &'a dyn TranslationGateway,
    default_language: &'a str,
}

impl LabelSource for TranslatedLabels<'_> {
    fn label(&self, key: &str, language: &str) -> Result<Label> {
        let phrase = self.gateway.break_camel(key);
        debug!(key, from = self.default_language, to = language, "translating label");
        let translated = self
            .gateway
            .translate(&phrase, self.default_language, language)?;
        Ok(Label::Found(translated))
    }
}

/// Languages match when their primary subtags match (`en-US` ~ `en`)
fn same_language(a: &str, b: &str) -> bool {
    let a = normalize_locale(a);
    let b = normalize_locale(b);
    a.split('-').next() == b.split('-').next()
}

/// Builds the labelled data source for an ad-hoc request
pub struct AdHocResolver<'a> {
    sources: Vec<Box<dyn LabelSource + 'a>>,
}

impl<'a> AdHocResolver<'a> {
    /// Create a resolver with the standard chain
    ///
    /// # Arguments
    /// * `catalog` - Message catalog consulted first
    /// * `gateway` - Camel-case splitting and translation fallback
    /// * `default_language` - Language the camel-split keys are written in
    pub fn new(
        catalog: &'a dyn MessageSource,
        gateway: &'a dyn TranslationGateway,
        default_language: &'a str,
    ) -> Self {
        Self {
            sources: vec![
                Box::new(CatalogLabels { catalog }),
                Box::new(CamelLabels {
                    gateway,
                    default_language,
                }),
                Box::new(TranslatedLabels {
                    gateway,
                    default_language,
                }),
            ],
        }
    }

    /// Resolve the display label for one key
    pub fn resolve_label(&self, key: &str, language: &str) -> Result<String> {
        for source in &self.sources {
            if let Label::Found(label) = source.label(key, language)? {
                return Ok(label);
            }
        }
        // only reachable with an empty chain
        Ok(key.to_string())
    }

    /// Build `{name, value}` records for every payload entry, in payload order
    pub fn resolve(&self, payload: &Payload, language: &str) -> Result<RecordSource> {
        payload
            .iter()
            .map(|(key, value)| {
                let mut record = Record::new();
                record.insert("name".to_string(), Value::text(self.resolve_label(key, language)?));
                record.insert("value".to_string(), Value::text(value_to_string(value)?));
                Ok(record)
            })
            .collect()
    }

    /// Parse a raw JSON object payload and resolve it
    pub fn resolve_json(&self, json: &str, language: &str) -> Result<RecordSource> {
        let payload = parse_payload(json).map_err(|e| match e {
            ReportError::ParseError(msg) => ReportError::MalformedAdHocDataSource(msg),
            other => other,
        })?;
        self.resolve(&payload, language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use label_text::{MessageCatalog, TranslateError};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Records calls and answers with a bracketed phrase
    #[derive(Default)]
    struct RecordingGateway {
        calls: Mutex<Vec<(String, String, String)>>,
    }

    impl TranslationGateway for RecordingGateway {
        fn translate(&self, text: &str, from: &str, to: &str) -> std::result::Result<String, TranslateError> {
            self.calls
                .lock()
                .unwrap()
                .push((text.to_string(), from.to_string(), to.to_string()));
            Ok(format!("[{to}] {text}"))
        }
    }

    struct FailingGateway;

    impl TranslationGateway for FailingGateway {
        fn translate(&self, _: &str, _: &str, _: &str) -> std::result::Result<String, TranslateError> {
            Err(TranslateError::Decode("boom".to_string()))
        }
    }

    fn catalog() -> MessageCatalog {
        let mut catalog = MessageCatalog::new();
        catalog.add_message("en", "firstName", "First Name");
        catalog.add_message("ar", "total", "المجموع");
        catalog
    }

    #[test]
    fn test_catalog_hit() {
        let catalog = catalog();
        let gateway = RecordingGateway::default();
        let resolver = AdHocResolver::new(&catalog, &gateway, "en");

        assert_eq!(resolver.resolve_label("firstName", "en").unwrap(), "First Name");
        assert_eq!(resolver.resolve_label("total", "ar").unwrap(), "المجموع");
        assert!(gateway.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_default_language_camel_split() {
        let catalog = MessageCatalog::new();
        let gateway = RecordingGateway::default();
        let resolver = AdHocResolver::new(&catalog, &gateway, "en");

        assert_eq!(resolver.resolve_label("firstName", "en").unwrap(), "first Name :");
        assert_eq!(resolver.resolve_label("firstName", "EN-us").unwrap(), "first Name :");
        assert!(gateway.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_other_language_translates() {
        let catalog = MessageCatalog::new();
        let gateway = RecordingGateway::default();
        let resolver = AdHocResolver::new(&catalog, &gateway, "en");

        assert_eq!(resolver.resolve_label("firstName", "ar").unwrap(), "[ar] first Name");
        assert_eq!(
            *gateway.calls.lock().unwrap(),
            vec![("first Name".to_string(), "en".to_string(), "ar".to_string())]
        );
    }

    #[test]
    fn test_translation_failure_propagates() {
        let catalog = MessageCatalog::new();
        let resolver = AdHocResolver::new(&catalog, &FailingGateway, "en");

        let err = resolver.resolve_label("firstName", "ar").unwrap_err();
        assert!(matches!(err, ReportError::Translation(_)));
        // The default language never reaches the gateway
        assert_eq!(resolver.resolve_label("firstName", "en").unwrap(), "first Name :");
    }

    #[test]
    fn test_resolve_records_in_payload_order() {
        let catalog = catalog();
        let gateway = RecordingGateway::default();
        let resolver = AdHocResolver::new(&catalog, &gateway, "en");

        let source = resolver
            .resolve_json(r#"{ "firstName": "Sara", "invoiceNo": 42, "tags": ["a", "b"] }"#, "en")
            .unwrap();

        let rows: Vec<(String, String)> = source
            .iter()
            .map(|r| {
                (
                    r["name"].as_str().unwrap().to_string(),
                    r["value"].as_str().unwrap().to_string(),
                )
            })
            .collect();
        assert_eq!(
            rows,
            vec![
                ("First Name".to_string(), "Sara".to_string()),
                ("invoice No :".to_string(), "42".to_string()),
                ("tags :".to_string(), r#"["a","b"]"#.to_string()),
            ]
        );
    }

    #[test]
    fn test_malformed_payload() {
        let catalog = MessageCatalog::new();
        let resolver = AdHocResolver::new(&catalog, &FailingGateway, "en");

        for json in ["[1, 2]", "{ broken", "\"text\""] {
            assert!(matches!(
                resolver.resolve_json(json, "en"),
                Err(ReportError::MalformedAdHocDataSource(_))
            ));
        }
    }

    #[test]
    fn test_empty_payload() {
        let catalog = MessageCatalog::new();
        let resolver = AdHocResolver::new(&catalog, &FailingGateway, "ar");
        assert!(resolver.resolve_json("{}", "fr").unwrap().is_empty());
    }
}
