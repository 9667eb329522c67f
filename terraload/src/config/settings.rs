//! Settings structs.
//!
//! Each struct maps to one `[section]` of the INI config file. Parsing lives
//! in [`super::parser`].

use super::defaults::*;

/// Complete configuration loaded from `config.ini`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TerraloadConfig {
    /// Request admission settings (`[scheduler]`).
    pub scheduler: SchedulerConfig,
    /// Tile tree settings (`[tiles]`).
    pub tiles: TileLoadConfig,
}

/// Configuration for the [`RequestScheduler`](crate::request::RequestScheduler).
///
/// # Example
///
/// ```ignore
/// use terraload::config::SchedulerConfig;
///
/// let config = SchedulerConfig::default()
///     .with_max_requests(16)
///     .with_max_requests_per_server(4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Maximum simultaneous throttled requests. Unthrottled requests ignore it.
    pub max_requests: usize,
    /// Maximum simultaneous throttled-by-server requests per server key.
    pub max_requests_per_server: usize,
    /// When false every request starts immediately.
    pub throttle_requests: bool,
    /// Capacity of the admission queue.
    pub request_queue_length: usize,
    /// Log statistics at the end of every tick.
    pub debug_show_statistics: bool,
    /// Base URL for resolving relative request URLs.
    pub base_url: String,
    /// Per-subscriber buffer of completion events.
    pub completed_event_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            max_requests_per_server: DEFAULT_MAX_REQUESTS_PER_SERVER,
            throttle_requests: DEFAULT_THROTTLE_REQUESTS,
            request_queue_length: DEFAULT_REQUEST_QUEUE_LENGTH,
            debug_show_statistics: DEFAULT_DEBUG_SHOW_STATISTICS,
            base_url: DEFAULT_BASE_URL.to_string(),
            completed_event_capacity: DEFAULT_COMPLETED_EVENT_CAPACITY,
        }
    }
}

impl SchedulerConfig {
    /// Sets the global request limit.
    pub fn with_max_requests(mut self, max_requests: usize) -> Self {
        self.max_requests = max_requests;
        self
    }

    /// Sets the per-server request limit.
    pub fn with_max_requests_per_server(mut self, max_requests_per_server: usize) -> Self {
        self.max_requests_per_server = max_requests_per_server;
        self
    }

    /// Enables or disables throttling.
    pub fn with_throttle_requests(mut self, throttle_requests: bool) -> Self {
        self.throttle_requests = throttle_requests;
        self
    }

    /// Sets the admission queue capacity.
    pub fn with_request_queue_length(mut self, request_queue_length: usize) -> Self {
        self.request_queue_length = request_queue_length;
        self
    }

    /// Enables or disables per-tick statistics logging.
    pub fn with_debug_show_statistics(mut self, debug_show_statistics: bool) -> Self {
        self.debug_show_statistics = debug_show_statistics;
        self
    }

    /// Sets the base URL for relative request URLs.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Configuration for the [`TileTree`](crate::tile::TileTree).
#[derive(Debug, Clone, PartialEq)]
pub struct TileLoadConfig {
    /// Tiles a replacement policy should keep loaded.
    pub tile_cache_size: usize,
    /// Deepest level [`TileTree::children`](crate::tile::TileTree::children)
    /// subdivides to.
    pub max_level: u32,
}

impl Default for TileLoadConfig {
    fn default() -> Self {
        Self {
            tile_cache_size: DEFAULT_TILE_CACHE_SIZE,
            max_level: DEFAULT_MAX_LEVEL,
        }
    }
}

impl TileLoadConfig {
    /// Sets the tile cache size.
    pub fn with_tile_cache_size(mut self, tile_cache_size: usize) -> Self {
        self.tile_cache_size = tile_cache_size;
        self
    }

    /// Sets the maximum subdivision level.
    pub fn with_max_level(mut self, max_level: u32) -> Self {
        self.max_level = max_level;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.max_requests, 50);
        assert_eq!(config.max_requests_per_server, 6);
        assert!(config.throttle_requests);
        assert_eq!(config.request_queue_length, 20);
        assert!(!config.debug_show_statistics);
        assert_eq!(config.base_url, "http://localhost/");
    }

    #[test]
    fn test_scheduler_builders() {
        let config = SchedulerConfig::default()
            .with_max_requests(3)
            .with_max_requests_per_server(1)
            .with_throttle_requests(false)
            .with_request_queue_length(5)
            .with_debug_show_statistics(true)
            .with_base_url("https://example.com/");

        assert_eq!(config.max_requests, 3);
        assert_eq!(config.max_requests_per_server, 1);
        assert!(!config.throttle_requests);
        assert_eq!(config.request_queue_length, 5);
        assert!(config.debug_show_statistics);
        assert_eq!(config.base_url, "https://example.com/");
    }

    #[test]
    fn test_tile_defaults() {
        let config = TileLoadConfig::default().with_max_level(4);
        assert_eq!(config.tile_cache_size, DEFAULT_TILE_CACHE_SIZE);
        assert_eq!(config.max_level, 4);
    }
}
