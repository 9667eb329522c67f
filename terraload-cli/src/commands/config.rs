//! Show the effective configuration.

use std::path::Path;
use terraload::config::{default_config_path, TerraloadConfig};

use crate::error::CliResult;

/// Print where the configuration comes from and every resolved value.
pub fn run(path: Option<&Path>, config: &TerraloadConfig) -> CliResult<()> {
    let source = path.map_or_else(default_config_path, Path::to_path_buf);
    let status = if source.exists() { "" } else { " (not found, using defaults)" };

    println!("Config file: {}{}", source.display(), status);
    println!();

    let scheduler = &config.scheduler;
    println!("[scheduler]");
    println!("  max_requests = {}", scheduler.max_requests);
    println!("  max_requests_per_server = {}", scheduler.max_requests_per_server);
    println!("  throttle_requests = {}", scheduler.throttle_requests);
    println!("  request_queue_length = {}", scheduler.request_queue_length);
    println!("  debug_show_statistics = {}", scheduler.debug_show_statistics);
    println!("  base_url = {}", scheduler.base_url);
    println!("  completed_event_capacity = {}", scheduler.completed_event_capacity);
    println!();

    println!("[tiles]");
    println!("  tile_cache_size = {}", config.tiles.tile_cache_size);
    println!("  max_level = {}", config.tiles.max_level);

    Ok(())
}
