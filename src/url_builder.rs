use crate::error::{Result, UrlPathError};
use crate::qs;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub use crate::qs::QueryParams;

/// An immutable URL under construction.
///
/// Every operation borrows the receiver and returns a fresh `UrlPath`, so one
/// base can be extended in several directions without being modified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UrlPath {
    href: String,
}

impl UrlPath {
    /// Creates a new `UrlPath` from a base or full URL.
    ///
    /// # Arguments
    /// * `href` - The base or full URL, optionally carrying a query string.
    ///
    /// # Errors
    /// Returns `UrlPathError::InvalidArgument` if `href` is empty.
    ///
    /// # Returns
    /// * `Result<Self>` - The created `UrlPath`.
    pub fn new(href: impl Into<String>) -> Result<Self> {
        let href = href.into();
        if href.is_empty() {
            return Err(UrlPathError::missing("href"));
        }

        Ok(UrlPath { href })
    }

    /// The full URL, query string included.
    #[must_use]
    pub fn href(&self) -> &str {
        &self.href
    }

    /// Everything before the first `?`.
    #[must_use]
    pub fn base(&self) -> &str {
        self.href.split_once('?').map_or(self.href.as_str(), |(base, _)| base)
    }

    /// Everything after the first `?`, if there is one.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.href.split_once('?').map(|(_, query)| query)
    }

    /// Joins a path onto the end of the current one.
    ///
    /// Exactly one `/` separates the current path and `path`. Query parameters
    /// already on the URL are moved behind the joined path, after any query
    /// string `path` brings along.
    ///
    /// # Arguments
    /// * `path` - The path to append, with or without a leading `/`.
    ///
    /// # Errors
    /// Returns `UrlPathError::InvalidArgument` if `path` is empty.
    ///
    /// # Returns
    /// * `Result<Self>` - The joined `UrlPath`.
    pub fn join_path(&self, path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(UrlPathError::missing("path"));
        }

        if let Some((base, query)) = self.href.split_once('?') {
            let existing = Self::query_string_to_object(query);
            log::trace!("Joining {path} onto {base}, re-adding {} parameter(s)", existing.len());
            return Ok(UrlPath::new(base)?.join_path(path)?.add_query_params(&existing));
        }

        let path = path.strip_prefix('/').unwrap_or(path);
        let href = if self.href.ends_with('/') {
            format!("{}{path}", self.href)
        } else {
            format!("{}/{path}", self.href)
        };

        Ok(UrlPath { href })
    }

    /// Appends query parameters.
    ///
    /// Parameters are added, never replaced: a key already present in the
    /// query string appears twice afterwards. The separator is appended even
    /// when `params` serializes to nothing.
    ///
    /// # Arguments
    /// * `params` - The parameters to append, in order.
    ///
    /// # Returns
    /// * `Self` - The extended `UrlPath`.
    #[must_use]
    pub fn add_query_params(&self, params: &QueryParams) -> Self {
        let serialized = qs::stringify(params);
        let separator = if self.href.contains('?') { '&' } else { '?' };
        UrlPath {
            href: format!("{}{separator}{serialized}", self.href),
        }
    }

    /// Appends string pairs as query parameters, keeping repeated keys.
    #[must_use]
    pub fn add_args(&self, args: &[(&str, &str)]) -> Self {
        args.iter().fold(self.clone(), |url, (key, value)| {
            let mut params = QueryParams::new();
            params.insert((*key).to_string(), Value::from(*value));
            url.add_query_params(&params)
        })
    }

    /// Appends the fields of any serializable value as query parameters.
    ///
    /// # Errors
    /// Returns `UrlPathError::Serialize` if `params` fails to serialize, or
    /// `UrlPathError::InvalidParams` if it does not serialize to a map.
    pub fn add_query<T: Serialize + ?Sized>(&self, params: &T) -> Result<Self> {
        match serde_json::to_value(params)? {
            Value::Object(map) => Ok(self.add_query_params(&map)),
            other => Err(UrlPathError::InvalidParams(format!(
                "expected a map of parameters, got {other}"
            ))),
        }
    }

    /// The parameters of this URL's own query string.
    #[must_use]
    pub fn query_params(&self) -> QueryParams {
        Self::query_string_to_object(self.query())
    }

    /// Parses a query string into parameters.
    ///
    /// An absent or empty query string gives an empty map.
    #[must_use]
    pub fn query_string_to_object<'a>(query: impl Into<Option<&'a str>>) -> QueryParams {
        match query.into() {
            Some(query) => qs::parse(query),
            None => QueryParams::new(),
        }
    }

    /// Parses a dynamically typed query string into parameters.
    ///
    /// Anything other than a JSON string gives an empty map.
    #[must_use]
    pub fn query_value_to_object(value: &Value) -> QueryParams {
        match value {
            Value::String(query) => qs::parse(query),
            other => {
                log::debug!("Ignoring non-string query string: {other}");
                QueryParams::new()
            }
        }
    }

    /// Parses the href strictly into a `url::Url`.
    ///
    /// # Errors
    /// Returns `UrlPathError::InvalidUrl` if the href is not an absolute URL.
    pub fn to_url(&self) -> Result<url::Url> {
        Ok(url::Url::parse(&self.href)?)
    }
}

impl fmt::Display for UrlPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href)
    }
}

impl AsRef<str> for UrlPath {
    fn as_ref(&self) -> &str {
        &self.href
    }
}

impl FromStr for UrlPath {
    type Err = UrlPathError;

    fn from_str(href: &str) -> Result<Self> {
        UrlPath::new(href)
    }
}

impl TryFrom<String> for UrlPath {
    type Error = UrlPathError;

    fn try_from(href: String) -> Result<Self> {
        UrlPath::new(href)
    }
}

impl TryFrom<&str> for UrlPath {
    type Error = UrlPathError;

    fn try_from(href: &str) -> Result<Self> {
        UrlPath::new(href)
    }
}

impl From<url::Url> for UrlPath {
    fn from(url: url::Url) -> Self {
        UrlPath { href: url.into() }
    }
}

impl From<UrlPath> for String {
    fn from(url: UrlPath) -> Self {
        url.href
    }
}
