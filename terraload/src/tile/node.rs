//! A single quadtree node.

use super::bounds::TileBounds;
use super::key::TileKey;
use super::state::TileState;
use super::water_mask::WaterMaskHandle;
use crate::coord::Rectangle;
use crate::imagery::LayerImagery;
use crate::render::{TextureHandle, VertexArrayHandle};
use crate::terrain::{MeshSummary, TerrainData, TileTerrain};
use std::fmt;
use std::sync::Arc;

/// Translation and scale that maps a tile onto its whole water mask.
pub const IDENTITY_TRANSLATION_AND_SCALE: [f64; 4] = [0.0, 0.0, 1.0, 1.0];

/// One tile and every resource it holds.
///
/// Tiles live in a [`TileTree`](super::TileTree) and refer to their parent
/// and children by key.
pub struct Tile {
    pub(crate) key: TileKey,
    pub(crate) rectangle: Rectangle,
    pub(crate) parent: Option<TileKey>,
    pub(crate) children: Option<[TileKey; 4]>,
    pub(crate) state: TileState,
    pub(crate) is_renderable: bool,
    pub(crate) terrain_data: Option<Arc<dyn TerrainData>>,
    /// Whether the provider is known to have this tile's own data.
    pub(crate) data_available: bool,
    pub(crate) loaded_terrain: Option<TileTerrain>,
    pub(crate) upsampled_terrain: Option<TileTerrain>,
    pub(crate) water_mask: Option<WaterMaskHandle>,
    pub(crate) water_mask_translation_and_scale: [f64; 4],
    pub(crate) vertex_array: Option<VertexArrayHandle>,
    pub(crate) mesh_summary: Option<MeshSummary>,
    pub(crate) imagery: Vec<LayerImagery>,
    pub(crate) bounds: Option<TileBounds>,
}

impl Tile {
    pub(crate) fn new(key: TileKey, rectangle: Rectangle, parent: Option<TileKey>) -> Self {
        Self {
            key,
            rectangle,
            parent,
            children: None,
            state: TileState::Start,
            is_renderable: false,
            terrain_data: None,
            data_available: false,
            loaded_terrain: None,
            upsampled_terrain: None,
            water_mask: None,
            water_mask_translation_and_scale: IDENTITY_TRANSLATION_AND_SCALE,
            vertex_array: None,
            mesh_summary: None,
            imagery: Vec::new(),
            bounds: None,
        }
    }

    pub fn key(&self) -> TileKey {
        self.key
    }

    pub fn rectangle(&self) -> &Rectangle {
        &self.rectangle
    }

    pub fn parent(&self) -> Option<TileKey> {
        self.parent
    }

    /// Child keys, once the children have been created.
    pub fn children(&self) -> Option<[TileKey; 4]> {
        self.children
    }

    pub fn state(&self) -> TileState {
        self.state
    }

    /// True once geometry exists and every layer can be drawn.
    pub fn is_renderable(&self) -> bool {
        self.is_renderable
    }

    pub fn terrain_data(&self) -> Option<&Arc<dyn TerrainData>> {
        self.terrain_data.as_ref()
    }

    pub fn loaded_terrain(&self) -> Option<&TileTerrain> {
        self.loaded_terrain.as_ref()
    }

    pub fn upsampled_terrain(&self) -> Option<&TileTerrain> {
        self.upsampled_terrain.as_ref()
    }

    /// The water mask texture in use, if any.
    pub fn water_mask_texture(&self) -> Option<TextureHandle> {
        self.water_mask.as_ref().map(WaterMaskHandle::texture)
    }

    pub fn water_mask_translation_and_scale(&self) -> [f64; 4] {
        self.water_mask_translation_and_scale
    }

    pub fn vertex_array(&self) -> Option<VertexArrayHandle> {
        self.vertex_array
    }

    pub fn mesh_summary(&self) -> Option<&MeshSummary> {
        self.mesh_summary.as_ref()
    }

    /// Per-layer imagery, indexed like the layer collection.
    pub fn imagery(&self) -> &[LayerImagery] {
        &self.imagery
    }

    pub fn bounds(&self) -> Option<&TileBounds> {
        self.bounds.as_ref()
    }

    /// True while a terrain attempt is pending.
    pub fn has_terrain_attempt(&self) -> bool {
        self.loaded_terrain.is_some() || self.upsampled_terrain.is_some()
    }

    /// True when the tile's terrain was upsampled and every layer with
    /// imagery is drawn from an ancestor's texture.
    pub fn upsampled_from_parent(&self) -> bool {
        let terrain_upsampled = self
            .terrain_data
            .as_ref()
            .is_some_and(|data| data.was_created_by_upsampling());
        terrain_upsampled && self.imagery.iter().all(|layer| layer.texture.is_none())
    }

    pub(crate) fn imagery_done(&self) -> bool {
        self.imagery.iter().all(LayerImagery::is_done)
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tile")
            .field("key", &self.key)
            .field("state", &self.state)
            .field("is_renderable", &self.is_renderable)
            .field("has_terrain_data", &self.terrain_data.is_some())
            .field("loaded_terrain", &self.loaded_terrain)
            .field("upsampled_terrain", &self.upsampled_terrain)
            .field("vertex_array", &self.vertex_array)
            .field("layers", &self.imagery.len())
            .finish()
    }
}
