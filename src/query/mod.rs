use url::form_urlencoded;

use crate::config::SerializerConfig;
use crate::flex::tokenize;

/// The three directive lists extracted from an incoming request, read exactly
/// once per request to seed the root planning context. Nested serializers get
/// their directives from their parent and never consult the request.
#[derive(Debug, Clone, Default)]
pub struct QueryDirectives {
    pub include: Vec<String>,
    pub fields: Vec<String>,
    pub omit: Vec<String>,
}

impl QueryDirectives {
    /// Parse the raw query string of a request. Each directive accepts either
    /// a comma-joined value (`include=a,b.c`) or a repeated array-style
    /// parameter (`include[]=a&include[]=b.c`); the comma form wins when both
    /// are present and non-empty.
    pub fn from_query_str(query: &str, config: &SerializerConfig) -> Self {
        let pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        Self {
            include: param_values(&pairs, &config.include_param),
            fields: param_values(&pairs, &config.fields_param),
            omit: param_values(&pairs, &config.omit_param),
        }
    }
}

fn param_values(pairs: &[(String, String)], name: &str) -> Vec<String> {
    let comma_form: Vec<String> = pairs
        .iter()
        .filter(|(k, _)| k == name)
        .flat_map(|(_, v)| tokenize(v))
        .collect();
    if !comma_form.is_empty() {
        return comma_form;
    }

    let array_name = format!("{}[]", name);
    pairs
        .iter()
        .filter(|(k, _)| *k == array_name)
        .flat_map(|(_, v)| tokenize(v))
        .collect()
}
