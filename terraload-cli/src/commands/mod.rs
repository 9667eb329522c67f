//! CLI command implementations.
//!
//! - [`config`] - Show the effective configuration
//! - [`fetch`] - Fetch URLs through the scheduler
//! - [`server_key`] - Classify a URL by server
//! - [`simulate`] - Synthetic tile-loading session

pub mod common;
pub mod config;
pub mod fetch;
pub mod server_key;
pub mod simulate;
