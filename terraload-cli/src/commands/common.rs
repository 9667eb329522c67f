//! Helpers shared across CLI commands.

use std::path::Path;
use terraload::config::{SchedulerConfig, TerraloadConfig};

use crate::error::CliResult;

/// Loads the config at `path`, or the default config file when none is given.
pub fn load_config(path: Option<&Path>) -> CliResult<TerraloadConfig> {
    let config = match path {
        Some(path) => TerraloadConfig::load_from(path)?,
        None => TerraloadConfig::load()?,
    };
    Ok(config)
}

/// Applies command-line overrides on top of the file settings.
pub fn scheduler_config(
    base: &SchedulerConfig,
    max_requests: Option<usize>,
    max_requests_per_server: Option<usize>,
) -> SchedulerConfig {
    let mut config = base.clone();
    if let Some(max) = max_requests {
        config = config.with_max_requests(max);
    }
    if let Some(max) = max_requests_per_server {
        config = config.with_max_requests_per_server(max);
    }
    config
}
