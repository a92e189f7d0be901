use std::fmt;

#[derive(Debug)]
pub enum UrlPathError {
    /// A required argument was empty
    InvalidArgument(String),
    /// Query parameters did not serialize to a key/value map
    InvalidParams(String),
    /// Represents serde serialization errors
    Serialize(serde_json::Error),
    /// Represents strict URL parsing errors
    InvalidUrl(url::ParseError),
    /// Represents missing environment variable errors
    MissingEnvVar(String),
}

impl UrlPathError {
    pub(crate) fn missing(parameter: &str) -> Self {
        UrlPathError::InvalidArgument(format!("missing required parameter: {parameter}"))
    }
}

impl std::error::Error for UrlPathError {}

impl fmt::Display for UrlPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlPathError::InvalidArgument(e) => write!(f, "Invalid argument: {e}"),
            UrlPathError::InvalidParams(e) => write!(f, "Invalid query parameters: {e}"),
            UrlPathError::Serialize(e) => write!(f, "Serialize error: {e}"),
            UrlPathError::InvalidUrl(e) => write!(f, "Invalid URL: {e}"),
            UrlPathError::MissingEnvVar(var) => write!(
                f,
                "Missing required environment variable: {var}\n\
                 Please set it in your environment or .env file"
            ),
        }
    }
}

impl From<serde_json::Error> for UrlPathError {
    fn from(err: serde_json::Error) -> Self {
        UrlPathError::Serialize(err)
    }
}

impl From<url::ParseError> for UrlPathError {
    fn from(err: url::ParseError) -> Self {
        UrlPathError::InvalidUrl(err)
    }
}

/// Helper type for Result with `UrlPathError`
pub type Result<T> = std::result::Result<T, UrlPathError>;
