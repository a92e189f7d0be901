use dotenv::dotenv;
use std::env;
use std::process;
use url_path::config;
use url_path::error::Result;
use url_path::url_builder::UrlPath;

/// Applies one command line argument to `url`.
///
/// `?a=1&b=2` appends a query string, `key=value` appends one parameter and
/// anything else is joined as a path.
fn apply_arg(url: &UrlPath, arg: &str) -> Result<UrlPath> {
    if let Some(query) = arg.strip_prefix('?') {
        return Ok(url.add_query_params(&UrlPath::query_string_to_object(query)));
    }

    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() && !key.contains('/') => {
            Ok(url.add_args(&[(key, value)]))
        }
        _ => url.join_path(arg),
    }
}

/// Builds a URL from the base stored in `base_var` and the given arguments.
fn build_url(base_var: &str, args: impl IntoIterator<Item = String>) -> Result<UrlPath> {
    let base = config::url_from_env(base_var)?;
    log::debug!("Base URL: {base}");

    args.into_iter().try_fold(base, |url, arg| apply_arg(&url, &arg))
}

fn run() -> Result<UrlPath> {
    config::validate_env_vars()?;
    build_url(config::BASE_URL_VAR, env::args().skip(1))
}

fn main() {
    dotenv().ok();
    env_logger::init();

    match run() {
        Ok(url) => println!("{url}"),
        Err(e) => {
            eprintln!("✗ {e}");
            process::exit(1);
        }
    }
}
