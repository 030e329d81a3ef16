//! The field annotation mini-language: naming tags pick the emitted name,
//! attribute tags add key:value pairs to leaf properties.

use serde_json::{Map, Value};

use crate::errors::MappingError;
use crate::model::Field;

/// Naming tag token that removes a field from the output entirely.
pub const SKIP_SENTINEL: &str = "-";

/// Interpreted annotations for one field.
#[derive(Debug, Default)]
pub struct FieldTags {
    /// Name to emit the field under. `None` falls back to the declared name.
    pub external_name: Option<String>,
    pub skip: bool,
    /// Extra key:value pairs merged into the leaf property object.
    pub attributes: Map<String, Value>,
}

/// Parse a field's raw tag strings.
///
/// The naming tag's first comma-separated token is the external name; `-`
/// skips the field. Attribute segments must have a `key:value` shape; the
/// value keeps any further colons. Whitespace is significant throughout.
pub fn interpret(field: &Field) -> Result<FieldTags, MappingError> {
    let mut tags = FieldTags::default();

    if let Some(raw) = &field.naming_tag {
        let first = raw.split(',').next().unwrap_or("");
        if first == SKIP_SENTINEL {
            tags.skip = true;
            return Ok(tags);
        }
        if !first.is_empty() {
            tags.external_name = Some(first.to_string());
        }
    }

    if let Some(raw) = &field.attr_tag
        && !raw.is_empty()
    {
        for segment in raw.split(',') {
            let (key, value) = segment.split_once(':').ok_or_else(|| {
                MappingError::MalformedAttribute {
                    field: field
                        .name
                        .clone()
                        .unwrap_or_else(|| "<anonymous>".to_string()),
                    segment: segment.to_string(),
                }
            })?;
            tags.attributes
                .insert(key.to_string(), Value::String(value.to_string()));
        }
    }

    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeRef;

    fn field(naming: Option<&str>, attr: Option<&str>) -> Field {
        Field {
            name: Some("name".to_string()),
            ty: TypeRef::Named("String".to_string()),
            naming_tag: naming.map(str::to_string),
            attr_tag: attr.map(str::to_string),
        }
    }

    #[test]
    fn test_naming_tag_first_token() {
        let tags = interpret(&field(Some("user_name,omitempty"), None)).unwrap();
        assert_eq!(tags.external_name, Some("user_name".to_string()));
        assert!(!tags.skip);
    }

    #[test]
    fn test_skip_sentinel() {
        let tags = interpret(&field(Some("-"), None)).unwrap();
        assert!(tags.skip);
        assert_eq!(tags.external_name, None);
    }

    #[test]
    fn test_empty_first_token_falls_back() {
        let tags = interpret(&field(Some(",omitempty"), None)).unwrap();
        assert_eq!(tags.external_name, None);
        let tags = interpret(&field(Some(""), None)).unwrap();
        assert_eq!(tags.external_name, None);
    }

    #[test]
    fn test_attribute_pairs() {
        let tags =
            interpret(&field(None, Some("analyzer:ik_smart,index:false"))).unwrap();
        assert_eq!(tags.attributes["analyzer"], "ik_smart");
        assert_eq!(tags.attributes["index"], "false");
    }

    #[test]
    fn test_attribute_value_keeps_extra_colons() {
        let tags = interpret(&field(None, Some("format:HH:mm:ss"))).unwrap();
        assert_eq!(tags.attributes["format"], "HH:mm:ss");
    }

    #[test]
    fn test_attribute_whitespace_is_significant() {
        let tags = interpret(&field(None, Some("analyzer:ik_smart, index:false"))).unwrap();
        assert_eq!(tags.attributes[" index"], "false");
    }

    #[test]
    fn test_malformed_attribute_errors() {
        let err = interpret(&field(None, Some("analyzer"))).unwrap_err();
        match err {
            MappingError::MalformedAttribute { field, segment } => {
                assert_eq!(field, "name");
                assert_eq!(segment, "analyzer");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_attribute_tag_is_noop() {
        let tags = interpret(&field(None, Some(""))).unwrap();
        assert!(tags.attributes.is_empty());
    }
}
