#[path = "config.rs"]
pub mod config;

#[path = "qs.rs"]
pub mod qs;

#[path = "url_builder.rs"]
pub mod url_builder;

#[path = "error.rs"]
pub mod error;

pub use error::{Result, UrlPathError};
pub use url_builder::{QueryParams, UrlPath};
