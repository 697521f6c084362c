/// True when any configured wildcard token appears in `values`. A disabled
/// token set (None) never matches.
pub fn contains_wildcard(values: &[String], wildcard_values: Option<&[String]>) -> bool {
    match wildcard_values {
        Some(tokens) => values.iter().any(|v| tokens.iter().any(|t| t == v)),
        None => false,
    }
}

/// Substitute a wildcard directive set with the server-declared allow-list.
///
/// Only the root level ever has a `permitted` universe; without one the values
/// pass through untouched and the planner's wildcard branch handles "keep
/// everything" on its own.
pub fn expand_wildcard(
    values: Vec<String>,
    permitted: Option<&[String]>,
    wildcard_values: Option<&[String]>,
) -> Vec<String> {
    if !contains_wildcard(&values, wildcard_values) {
        return values;
    }
    match permitted {
        Some(allowed) => allowed.to_vec(),
        None => values,
    }
}
