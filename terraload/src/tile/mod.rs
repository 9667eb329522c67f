//! Tile quadtree and per-tile load pipeline.
//!
//! A [`TileTree`] owns every [`Tile`] of one tiling scheme. Each tick the
//! caller drives the tiles it cares about with
//! [`TileTree::process_state_machine`]:
//!
//! ```text
//! Start ──prepare──► Loading ──renderable + all attempts done──► Ready
//!                       │
//!                       └──no terrain left, nothing to wait for──► Failed
//! ```
//!
//! A failed tile returns to `Loading` when its parent publishes new data.
//! Eviction is the caller's business: [`TileTree::eligible_for_unloading`]
//! says whether a tile can be freed now and [`TileTree::free_resources`]
//! frees it with its whole subtree.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use terraload::coord::GeographicTilingScheme;
//! use terraload::tile::TileTree;
//!
//! let mut tree = TileTree::new(Arc::new(GeographicTilingScheme::new()), config.tiles);
//! let roots = tree.create_level_zero_tiles().to_vec();
//!
//! loop {
//!     scheduler.update();
//!     for &key in &roots {
//!         tree.process_state_machine(key, &mut context, &provider, &mut layers, &mut scheduler);
//!     }
//! }
//! ```

mod bounds;
mod key;
mod node;
mod state;
mod tree;
mod water_mask;

pub use bounds::TileBounds;
pub use key::TileKey;
pub use node::{Tile, IDENTITY_TRANSLATION_AND_SCALE};
pub use state::TileState;
pub use tree::TileTree;
pub use water_mask::{WaterMaskCache, WaterMaskHandle, LAND, WATER};
