//! Server key command - show how a URL is bucketed for throttling.

use terraload::config::TerraloadConfig;
use terraload::request::{derive_server_key, is_data_or_blob_uri, Url};

use crate::error::{CliError, CliResult};

/// Print the server key for `url`.
pub fn run(url: &str, base_url: Option<&str>, config: &TerraloadConfig) -> CliResult<()> {
    if is_data_or_blob_uri(url) {
        println!("(data/blob URI: never throttled)");
        return Ok(());
    }
    println!("{}", resolve(url, base_url.unwrap_or(&config.scheduler.base_url))?);
    Ok(())
}

fn resolve(url: &str, base_url: &str) -> CliResult<String> {
    let base = Url::parse(base_url)
        .map_err(|e| CliError::InvalidArgument(format!("base URL '{}': {}", base_url, e)))?;
    Ok(derive_server_key(url, Some(&base)))
}
