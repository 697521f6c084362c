use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlexError {
    #[error("No resource descriptor found at path: {path} when trying to resolve {name}")]
    UnresolvableType { path: String, name: String },

    #[error("Include path '{path}' is not supported (segment '{segment}')")]
    UnsupportedInclude { segment: String, path: String },

    #[error("This resource does not declare any includable relations")]
    IncludesNotSupported,

    #[error("Directive must be a string or an array of strings, got: {0}")]
    InvalidDirectiveShape(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}
