//! Default values for every configuration knob.

/// Maximum simultaneous throttled requests.
pub const DEFAULT_MAX_REQUESTS: usize = 50;

/// Maximum simultaneous throttled requests per server key.
pub const DEFAULT_MAX_REQUESTS_PER_SERVER: usize = 6;

/// Whether throttled requests are admitted through the queue at all.
pub const DEFAULT_THROTTLE_REQUESTS: bool = true;

/// Capacity of the priority queue of requests awaiting admission.
pub const DEFAULT_REQUEST_QUEUE_LENGTH: usize = 20;

/// Whether the scheduler logs its statistics every tick.
pub const DEFAULT_DEBUG_SHOW_STATISTICS: bool = false;

/// Base URL relative request URLs are resolved against.
pub const DEFAULT_BASE_URL: &str = "http://localhost/";

/// Buffered completion events per subscriber before the oldest are dropped.
pub const DEFAULT_COMPLETED_EVENT_CAPACITY: usize = 256;

/// Number of tiles a replacement policy keeps loaded.
pub const DEFAULT_TILE_CACHE_SIZE: usize = 100;

/// Deepest quadtree level tiles are subdivided to.
pub const DEFAULT_MAX_LEVEL: u32 = 20;
