//! Terraload - request scheduling and tile loading for streamed globes
//!
//! This library drives the two halves of streaming terrain and imagery onto
//! a globe: admitting network requests under concurrency limits, and moving
//! every quadtree tile through its terrain and imagery load pipeline.
//! Decoding, meshing, texture composition and rendering are left to the
//! caller through traits.
//!
//! # High-Level Loop
//!
//! Everything is polled from one thread, once per frame:
//!
//! ```ignore
//! use std::sync::Arc;
//! use terraload::config::TerraloadConfig;
//! use terraload::coord::GeographicTilingScheme;
//! use terraload::request::RequestScheduler;
//! use terraload::tile::TileTree;
//!
//! let config = TerraloadConfig::load()?;
//! let mut scheduler = RequestScheduler::new(config.scheduler.clone());
//! let mut tree = TileTree::new(Arc::new(GeographicTilingScheme::new()), config.tiles.clone());
//! let roots = tree.create_level_zero_tiles().to_vec();
//!
//! loop {
//!     scheduler.update();
//!     for &key in &roots {
//!         tree.process_state_machine(key, &mut context, &provider, &mut layers, &mut scheduler);
//!     }
//! }
//! ```

pub mod config;
pub mod coord;
pub mod imagery;
pub mod logging;
pub mod poll;
pub mod render;
pub mod request;
pub mod terrain;
pub mod tile;
