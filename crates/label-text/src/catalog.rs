//! Locale-keyed message catalog

use crate::{LabelTextError, Result};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Lookup of localized labels by key
///
/// A miss is an expected condition and is reported as `None`, never as an
/// error.
pub trait MessageSource: Send + Sync {
    /// Get the message for `key` in `locale`
    fn get_message(&self, key: &str, locale: &str) -> Option<String>;
}

/// Normalize a locale tag for lookup (`ar_EG` / `AR-eg` -> `ar-eg`)
pub fn normalize_locale(locale: &str) -> String {
    locale.trim().replace('_', "-").to_ascii_lowercase()
}

/// In-memory message catalog
///
/// Messages are grouped by normalized locale tag. Lookups for a regional tag
/// (`ar-EG`) fall back to the primary language (`ar`).
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    /// locale -> key -> message
    messages: HashMap<String, HashMap<String, String>>,
}

impl MessageCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `<basename>_<locale>.properties` file in a directory
    ///
    /// A file named exactly `<basename>.properties` has no locale and is
    /// skipped. Bundles are decoded as ISO-8859-1.
    ///
    /// # Arguments
    /// * `dir` - Directory to scan
    /// * `basename` - Bundle base name (e.g. `messages`)
    pub fn from_dir<P: AsRef<Path>>(dir: P, basename: &str) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|e| {
            LabelTextError::CatalogLoadError(format!("{}: {}", dir.display(), e))
        })?;

        let prefix = format!("{basename}_");
        let mut catalog = Self::new();

        for entry in entries {
            let path = entry?.path();
            let Some(stem) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(".properties"))
            else {
                continue;
            };
            let Some(locale) = stem.strip_prefix(&prefix) else {
                continue;
            };

            let file = BufReader::new(File::open(&path)?);
            let count = catalog.load_properties(locale, file)?;
            debug!(locale, count, path = %path.display(), "loaded message bundle");
        }

        Ok(catalog)
    }

    /// Load messages for a locale from `.properties` content
    ///
    /// Returns the number of messages loaded.
    pub fn load_properties<R: Read>(&mut self, locale: &str, input: R) -> Result<usize> {
        let bundle = java_properties::read(input)?;
        let count = bundle.len();
        self.messages
            .entry(normalize_locale(locale))
            .or_default()
            .extend(bundle);
        Ok(count)
    }

    /// Add a single message
    pub fn add_message(&mut self, locale: &str, key: &str, message: &str) {
        self.messages
            .entry(normalize_locale(locale))
            .or_default()
            .insert(key.to_string(), message.to_string());
    }

    /// Check if the catalog has any messages for a locale
    pub fn has_locale(&self, locale: &str) -> bool {
        self.messages.contains_key(&normalize_locale(locale))
    }

    /// Total number of messages across all locales
    pub fn len(&self) -> usize {
        self.messages.values().map(HashMap::len).sum()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &str, locale: &str) -> Option<&String> {
        self.messages.get(locale).and_then(|bundle| bundle.get(key))
    }
}

impl MessageSource for MessageCatalog {
    fn get_message(&self, key: &str, locale: &str) -> Option<String> {
        let locale = normalize_locale(locale);

        if let Some(message) = self.lookup(key, &locale) {
            return Some(message.clone());
        }

        let language = locale.split('-').next().unwrap_or_default();
        if language != locale {
            return self.lookup(key, language).cloned();
        }

        None
    }
}
