//! Locale variant selection

use crate::{LocaleVariant, ReportError, Result, TemplateDescriptor};

/// Find the locale variant matching `requested`, ignoring case
///
/// On failure the error lists every supported tag so the caller can retry.
pub fn resolve_locale<'a>(
    descriptor: &'a TemplateDescriptor,
    requested: &str,
) -> Result<&'a LocaleVariant> {
    descriptor
        .locales
        .iter()
        .find(|l| l.value.eq_ignore_ascii_case(requested))
        .ok_or_else(|| ReportError::UnsupportedLocale {
            requested: requested.to_string(),
            supported: descriptor.locale_values(),
        })
}
