//! Configuration for the scheduler and the tile tree.
//!
//! Every component takes a plain settings struct with a `Default` impl and
//! `with_*` builders. [`TerraloadConfig`] groups them and can be loaded from
//! an INI file:
//!
//! ```ini
//! [scheduler]
//! max_requests = 50
//! max_requests_per_server = 6
//! throttle_requests = true
//! request_queue_length = 20
//! debug_show_statistics = false
//! base_url = http://localhost/
//! completed_event_capacity = 256
//!
//! [tiles]
//! tile_cache_size = 100
//! max_level = 20
//! ```
//!
//! # Example
//!
//! ```ignore
//! use terraload::config::{default_config_path, TerraloadConfig};
//!
//! let config = TerraloadConfig::load_from(&default_config_path())?;
//! let scheduler = RequestScheduler::new(config.scheduler);
//! ```

mod defaults;
mod file;
mod parser;
mod settings;

pub use defaults::*;
pub use file::{config_directory, default_config_path, ConfigFileError};
pub use settings::{SchedulerConfig, TerraloadConfig, TileLoadConfig};
