//! Data binding against a resolved parameter set

use report_template::{ImageResource, Parameter, ParameterSet, RecordSource, Value};
use std::sync::Arc;

/// Target of a binding path
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound<'a> {
    Value(&'a Value),
    Records(&'a RecordSource),
    Image(&'a Arc<ImageResource>),
}

/// Split `name[3]` into its field and optional index
fn parse_segment(segment: &str) -> Option<(&str, Option<usize>)> {
    match segment.find('[') {
        Some(bracket_pos) => {
            let field = &segment[..bracket_pos];
            let index_str = segment[bracket_pos + 1..].strip_suffix(']')?;
            Some((field, Some(index_str.parse().ok()?)))
        }
        None => Some((segment, None)),
    }
}

fn step<'a>(current: &'a Value, field: &str, index: Option<usize>) -> Option<&'a Value> {
    let mut current = current;
    if !field.is_empty() {
        current = current.as_record()?.get(field)?;
    }
    if let Some(index) = index {
        current = current.as_sequence()?.get(index)?;
    }
    Some(current)
}

/// Resolve a binding path against a parameter set
///
/// Paths start with `$.` followed by a parameter name. Values can be
/// navigated with `.field` and `[index]`; a record source needs an index
/// before its fields (`$.items[0].sku`).
pub fn resolve_binding<'a>(path: &str, parameters: &'a ParameterSet) -> Option<Bound<'a>> {
    let path = path.strip_prefix("$.")?;
    let mut segments = path.split('.');

    let (name, index) = parse_segment(segments.next()?)?;
    let mut current = match (parameters.get(name)?, index) {
        (Parameter::Value(value), index) => step(value, "", index)?,
        (Parameter::Records(source), None) => {
            return segments.next().is_none().then_some(Bound::Records(source));
        }
        (Parameter::Records(source), Some(index)) => {
            let record = source.get(index)?;
            record.get(segments.next()?)?
        }
        (Parameter::Image(image), None) => {
            return segments.next().is_none().then_some(Bound::Image(image));
        }
        (Parameter::Image(_), Some(_)) => return None,
    };

    for segment in segments {
        let (field, index) = parse_segment(segment)?;
        current = step(current, field, index)?;
    }

    Some(Bound::Value(current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use report_template::{parse_payload, Record};

    fn parameters() -> ParameterSet {
        let payload = parse_payload(
            r#"{
                "title": "Invoice",
                "customer": { "name": "Jane", "phones": ["555-1", "555-2"] }
            }"#,
        )
        .unwrap();

        let mut parameters = ParameterSet::new();
        for (key, value) in payload {
            parameters.insert(key, Parameter::Value(value));
        }

        let mut row = Record::new();
        row.insert("sku".to_string(), Value::text("A1"));
        parameters.insert(
            "items".to_string(),
            Parameter::Records(RecordSource::new(vec![row])),
        );
        parameters
    }

    #[test]
    fn test_resolve_simple_value() {
        let parameters = parameters();
        assert_eq!(
            resolve_binding("$.title", &parameters),
            Some(Bound::Value(&Value::text("Invoice")))
        );
    }

    #[test]
    fn test_resolve_nested_value() {
        let parameters = parameters();
        assert_eq!(
            resolve_binding("$.customer.name", &parameters),
            Some(Bound::Value(&Value::text("Jane")))
        );
        assert_eq!(
            resolve_binding("$.customer.phones[1]", &parameters),
            Some(Bound::Value(&Value::text("555-2")))
        );
    }

    #[test]
    fn test_resolve_records() {
        let parameters = parameters();
        assert!(matches!(
            resolve_binding("$.items", &parameters),
            Some(Bound::Records(source)) if source.len() == 1
        ));
        assert_eq!(
            resolve_binding("$.items[0].sku", &parameters),
            Some(Bound::Value(&Value::text("A1")))
        );
    }

    #[test]
    fn test_resolve_missing() {
        let parameters = parameters();
        assert_eq!(resolve_binding("$.nope", &parameters), None);
        assert_eq!(resolve_binding("$.items[3].sku", &parameters), None);
        assert_eq!(resolve_binding("$.items.sku", &parameters), None);
        assert_eq!(resolve_binding("$.customer.phones[x]", &parameters), None);
        assert_eq!(resolve_binding("title", &parameters), None);
    }
}
