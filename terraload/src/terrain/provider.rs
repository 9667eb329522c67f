//! Collaborator traits implemented by terrain backends.

use super::error::TerrainResult;
use super::mesh::{TerrainMesh, WaterMask};
use crate::coord::TilingScheme;
use crate::request::{RequestHandle, RequestScheduler};
use crate::tile::TileKey;
use bytes::Bytes;
use futures::future::BoxFuture;
use std::fmt::Debug;
use std::sync::Arc;

/// Decoded terrain for one tile.
///
/// Mesh building and upsampling are asynchronous and may be deferred: a
/// `None` return means "too busy, ask again next tick".
pub trait TerrainData: Send + Sync + Debug {
    /// Land/water mask, if the data carries one.
    fn water_mask(&self) -> Option<&WaterMask>;

    /// True when this data was derived from an ancestor rather than loaded.
    fn was_created_by_upsampling(&self) -> bool;

    /// Whether the provider has data for the child `(child_x, child_y)` of
    /// the tile `(this_x, this_y)` this data belongs to.
    fn is_child_available(&self, this_x: u32, this_y: u32, child_x: u32, child_y: u32) -> bool;

    /// Starts building the mesh for `key`.
    fn create_mesh(
        &self,
        tiling_scheme: &dyn TilingScheme,
        key: TileKey,
    ) -> Option<BoxFuture<'static, TerrainResult<TerrainMesh>>>;

    /// Starts deriving data for the descendant `target` from this data,
    /// which belongs to `source`.
    fn upsample(
        &self,
        tiling_scheme: &dyn TilingScheme,
        source: TileKey,
        target: TileKey,
    ) -> Option<BoxFuture<'static, TerrainResult<Arc<dyn TerrainData>>>>;
}

/// Source of terrain for the tile tree.
pub trait TerrainProvider {
    /// Submits the geometry request for `key` through `scheduler`.
    ///
    /// Returns `None` when the scheduler rejected it; the attempt stays
    /// unloaded and asks again next tick.
    fn request_tile_geometry(
        &self,
        key: TileKey,
        scheduler: &mut RequestScheduler,
    ) -> Option<RequestHandle>;

    /// Decodes a geometry response.
    fn decode_tile_geometry(&self, key: TileKey, body: Bytes) -> TerrainResult<Arc<dyn TerrainData>>;

    /// Whether tiles from this provider carry water masks.
    fn has_water_mask(&self) -> bool;

    /// Explicit availability for `key`, when the provider knows it.
    ///
    /// `None` defers to the parent's data (roots are assumed available).
    fn tile_data_available(&self, _key: TileKey) -> Option<bool> {
        None
    }
}
