use std::collections::{HashMap, HashSet};

use serde_json::Value;

use super::error::FlexError;

/// Convert dot-notation such as `["a", "a.b", "a.d", "c"]` into current-level
/// names `["a", "c"]` and next-level fragments `{"a": ["b", "d"]}`.
///
/// Splitting happens on the first dot only; remainders keep their own dots and
/// are split again one level down. Current-level names are deduplicated but
/// keep first-encounter order, which later drives expansion order.
pub fn split_levels(paths: &[String]) -> (Vec<String>, HashMap<String, Vec<String>>) {
    let mut current: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut next_by_parent: HashMap<String, Vec<String>> = HashMap::new();

    for path in paths {
        match path.split_once('.') {
            Some((head, rest)) => {
                if seen.insert(head.to_string()) {
                    current.push(head.to_string());
                }
                next_by_parent
                    .entry(head.to_string())
                    .or_default()
                    .push(rest.to_string());
            }
            None => {
                if seen.insert(path.clone()) {
                    current.push(path.clone());
                }
            }
        }
    }

    (current, next_by_parent)
}

/// Tokenize the comma-joined form of a directive list. Whitespace is stripped
/// and empty tokens are discarded, so `"a, ,b"` yields `["a", "b"]`.
pub fn tokenize(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().replace(' ', ""))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Coerce a directive list arriving inside a JSON document. A string is
/// treated as the comma-joined form, an array must hold only strings, and
/// null/absent means "no constraint". Anything else is a caller contract
/// violation and fails fast.
pub fn directive_list_from_value(value: &Value) -> Result<Vec<String>, FlexError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok(tokenize(s)),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => {
                        let s = s.trim();
                        if !s.is_empty() {
                            out.push(s.to_string());
                        }
                    }
                    other => {
                        return Err(FlexError::InvalidDirectiveShape(other.to_string()));
                    }
                }
            }
            Ok(out)
        }
        other => Err(FlexError::InvalidDirectiveShape(other.to_string())),
    }
}
