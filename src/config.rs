use crate::error::{Result, UrlPathError};
use crate::url_builder::UrlPath;
use std::env;

/// Environment variable holding the base URL the command line tool builds on
pub const BASE_URL_VAR: &str = "URL_PATH_BASE";

/// Required environment variables for the application
const REQUIRED_ENV_VARS: &[&str] = &[BASE_URL_VAR];

/// Validates that all required environment variables are set
///
/// # Errors
/// Returns `UrlPathError::MissingEnvVar` if any required environment variable is missing
///
/// # Returns
/// * `Result<()>` - Ok if all required environment variables are present
pub fn validate_env_vars() -> Result<()> {
    let missing_vars: Vec<&str> = REQUIRED_ENV_VARS
        .iter()
        .copied()
        .filter(|var_name| env::var(var_name).is_err())
        .collect();

    if !missing_vars.is_empty() {
        return Err(UrlPathError::MissingEnvVar(missing_vars.join(", ")));
    }

    Ok(())
}

/// Gets a required environment variable
///
/// # Arguments
/// * `var_name` - The name of the environment variable to retrieve
///
/// # Errors
/// Returns `UrlPathError::MissingEnvVar` if the environment variable is not set
///
/// # Returns
/// * `Result<String>` - The value of the environment variable
pub fn get_required_env_var(var_name: &str) -> Result<String> {
    env::var(var_name).map_err(|_| UrlPathError::MissingEnvVar(var_name.to_string()))
}

/// Builds a `UrlPath` from the URL stored in an environment variable
///
/// # Errors
/// Returns `UrlPathError::MissingEnvVar` if the variable is not set, or
/// `UrlPathError::InvalidArgument` if it is empty
pub fn url_from_env(var_name: &str) -> Result<UrlPath> {
    UrlPath::new(get_required_env_var(var_name)?)
}

/// The base URL configured through `URL_PATH_BASE`
///
/// # Errors
/// See [`url_from_env`]
pub fn base_url() -> Result<UrlPath> {
    url_from_env(BASE_URL_VAR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_var() {
        let err = get_required_env_var("URL_PATH_TEST_NEVER_SET").unwrap_err();

        assert!(matches!(
            err,
            UrlPathError::MissingEnvVar(ref var) if var == "URL_PATH_TEST_NEVER_SET"
        ));
        assert!(err.to_string().contains(".env file"));
    }

    #[test]
    fn test_url_from_env() {
        env::set_var("URL_PATH_TEST_BASE", "https://example.com/api");

        let url = url_from_env("URL_PATH_TEST_BASE").unwrap();
        assert_eq!(url.href(), "https://example.com/api");
    }

    #[test]
    fn test_url_from_empty_env() {
        env::set_var("URL_PATH_TEST_EMPTY", "");

        assert!(matches!(
            url_from_env("URL_PATH_TEST_EMPTY"),
            Err(UrlPathError::InvalidArgument(_))
        ));
    }
}
