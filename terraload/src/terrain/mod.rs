//! Terrain attempts and the traits terrain backends implement.
//!
//! A tile holds up to two [`TileTerrain`] attempts at once: a direct load
//! from the [`TerrainProvider`] and an upsample from the nearest ancestor's
//! [`TerrainData`]. Decoding, meshing and upsampling algorithms live behind
//! the traits; this module only sequences them.
//!
//! # Example
//!
//! ```ignore
//! use terraload::terrain::TileTerrain;
//!
//! let mut attempt = TileTerrain::load();
//! attempt.process_load_state_machine(&mut context, &provider, &scheme, key, &mut scheduler);
//! ```

mod error;
mod mesh;
mod provider;
mod state;
mod tile_terrain;

pub use error::{TerrainError, TerrainResult};
pub use mesh::{BoundingSphere, MeshSummary, TerrainMesh, WaterMask};
pub use provider::{TerrainData, TerrainProvider};
pub use state::TerrainState;
pub use tile_terrain::{TileTerrain, UpsampleSource};
