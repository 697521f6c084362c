use serde_json::Value;

use super::error::FlexError;
use super::paths::directive_list_from_value;

/// Per-instance planning state: the directive triple in effect at this
/// nesting level, whether the level is the root (directives sourced from the
/// request) or nested (directives handed down by the parent), and the
/// relation names that were expanded while serializing.
///
/// A context lives for exactly one resource instance. Sibling elements of a
/// collection each get their own copy; nothing is shared or reused.
#[derive(Debug, Clone, Default)]
pub struct PlanningContext {
    pub include: Vec<String>,
    pub fields: Vec<String>,
    pub omit: Vec<String>,
    pub root: bool,
    pub expanded: Vec<String>,
}

impl PlanningContext {
    pub fn root(include: Vec<String>, fields: Vec<String>, omit: Vec<String>) -> Self {
        Self {
            include,
            fields,
            omit,
            root: true,
            expanded: Vec::new(),
        }
    }

    pub fn nested(include: Vec<String>, fields: Vec<String>, omit: Vec<String>) -> Self {
        Self {
            include,
            fields,
            omit,
            root: false,
            expanded: Vec::new(),
        }
    }
}

/// Fixed construction settings declared alongside an includable relation:
/// directive presets the child starts from when the parent hands down no
/// fragment of that kind. Cloned for every child instance so siblings never
/// alias each other's settings.
#[derive(Debug, Clone, Default)]
pub struct NestedSettings {
    pub include: Vec<String>,
    pub fields: Vec<String>,
    pub omit: Vec<String>,
}

impl NestedSettings {
    /// Parse settings from a JSON object, e.g. loaded from a descriptor
    /// declaration: `{"fields": "id,name", "omit": ["internal_notes"]}`.
    pub fn from_value(value: &Value) -> Result<Self, FlexError> {
        let obj = match value {
            Value::Object(obj) => obj,
            other => {
                return Err(FlexError::InvalidDirectiveShape(other.to_string()));
            }
        };

        Ok(Self {
            include: directive_list_from_value(obj.get("include").unwrap_or(&Value::Null))?,
            fields: directive_list_from_value(obj.get("fields").unwrap_or(&Value::Null))?,
            omit: directive_list_from_value(obj.get("omit").unwrap_or(&Value::Null))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_settings_parse_mixed_forms() {
        let settings = NestedSettings::from_value(&json!({
            "fields": "id,name",
            "omit": ["internal_notes"],
        }))
        .unwrap();
        assert_eq!(settings.fields, vec!["id".to_string(), "name".to_string()]);
        assert_eq!(settings.omit, vec!["internal_notes".to_string()]);
        assert!(settings.include.is_empty());
    }

    #[test]
    fn nested_settings_reject_non_objects() {
        assert!(NestedSettings::from_value(&json!("fields=id")).is_err());
        assert!(NestedSettings::from_value(&json!({"fields": 42})).is_err());
    }
}
