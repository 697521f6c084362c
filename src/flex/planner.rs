use std::collections::HashMap;

use super::wildcard::contains_wildcard;

/// Decide whether one field survives the current level's omit/sparse
/// directives.
///
/// Next-level omits take the form `{"this_level_field": ["deeper", ...]}`.
/// A field named in `omit` that also has a deeper continuation must not be
/// removed prematurely: `omit=house.rooms.kitchen` hides the kitchen, not the
/// whole house. A terminal omit wins over everything, including a sparse
/// wildcard.
pub fn should_field_exist(
    field_name: &str,
    omit: &[String],
    sparse: &[String],
    next_omit: &HashMap<String, Vec<String>>,
    wildcard_values: Option<&[String]>,
) -> bool {
    if omit.iter().any(|o| o == field_name) && !next_omit.contains_key(field_name) {
        false
    } else if contains_wildcard(sparse, wildcard_values) {
        true
    } else if !sparse.is_empty() && !sparse.iter().any(|s| s == field_name) {
        false
    } else {
        true
    }
}

/// Names to drop from the current resource, in declaration order.
///
/// When neither omit nor sparse directives are present the pass is skipped;
/// the result is identical to evaluating the rule on empty sets.
pub fn fields_to_remove(
    field_names: &[String],
    omit: &[String],
    sparse: &[String],
    next_omit: &HashMap<String, Vec<String>>,
    wildcard_values: Option<&[String]>,
) -> Vec<String> {
    if omit.is_empty() && sparse.is_empty() {
        return Vec::new();
    }

    field_names
        .iter()
        .filter(|name| !should_field_exist(name, omit, sparse, next_omit, wildcard_values))
        .cloned()
        .collect()
}

/// Names to expand into nested resources, in the order they first appear in
/// the (possibly wildcard-substituted) include set.
///
/// Only declared includable relations qualify; unknown candidates are skipped
/// silently. Each candidate is still subject to the current level's
/// omit/sparse rule, so a terminally-omitted relation never expands.
pub fn fields_to_expand(
    include: &[String],
    includable_names: &[String],
    omit: &[String],
    sparse: &[String],
    next_omit: &HashMap<String, Vec<String>>,
    wildcard_values: Option<&[String]>,
) -> Vec<String> {
    if include.is_empty() {
        return Vec::new();
    }

    let candidates: Vec<String> = if contains_wildcard(include, wildcard_values) {
        includable_names.to_vec()
    } else {
        include.to_vec()
    };

    candidates
        .into_iter()
        .filter(|name| includable_names.iter().any(|i| i == name))
        .filter(|name| should_field_exist(name, omit, sparse, next_omit, wildcard_values))
        .collect()
}
