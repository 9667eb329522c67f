//! Imagery layer seam.

use super::state::ImageryState;
use super::tile_imagery::{ImageryId, TileImagery};
use crate::coord::Rectangle;
use crate::render::{RenderContext, TextureHandle};
use crate::request::RequestScheduler;
use crate::tile::TileKey;

/// One overlay of imagery draped over the terrain.
///
/// The layer owns its imagery and reference counts it. Tiles only hold
/// [`ImageryId`]s obtained from
/// [`create_tile_imagery_skeletons`](Self::create_tile_imagery_skeletons)
/// and hand each one back through [`release_imagery`](Self::release_imagery)
/// exactly once.
pub trait ImageryLayer {
    /// Whether the layer is visible. Hidden layers get no skeletons.
    fn show(&self) -> bool;

    /// Whether the imagery provider has finished initializing.
    ///
    /// Until it has, the layer hands out placeholder skeletons.
    fn is_provider_ready(&self) -> bool;

    /// Attaches the imagery covering `rectangle` to the tile `key`.
    fn create_tile_imagery_skeletons(
        &mut self,
        key: TileKey,
        rectangle: &Rectangle,
    ) -> Vec<TileImagery>;

    /// Current state of `imagery`, polling any in-flight work.
    fn poll_imagery(&mut self, imagery: ImageryId) -> ImageryState;

    /// Starts fetching `imagery` through `scheduler`.
    fn request_imagery(&mut self, imagery: ImageryId, scheduler: &mut RequestScheduler);

    /// Creates the texture for received `imagery`.
    fn create_texture(&mut self, context: &mut dyn RenderContext, imagery: ImageryId);

    /// Maps the tile's texture coordinates into the imagery's.
    fn calculate_texture_translation_and_scale(
        &self,
        key: TileKey,
        rectangle: &Rectangle,
        imagery: ImageryId,
    ) -> [f64; 4];

    /// Composes the ready imagery of a tile into one texture owned by the tile.
    ///
    /// `None` when nothing could be composed.
    fn compose_tile_texture(
        &mut self,
        context: &mut dyn RenderContext,
        key: TileKey,
        ready: &[TileImagery],
    ) -> Option<TextureHandle>;

    /// Drops the tile's reference to `imagery`.
    fn release_imagery(&mut self, context: &mut dyn RenderContext, imagery: ImageryId);
}

/// Ordered imagery layers. Layer `i` maps to the tile's `i`-th [`LayerImagery`](super::LayerImagery).
#[derive(Default)]
pub struct ImageryLayerCollection {
    layers: Vec<Box<dyn ImageryLayer>>,
}

impl ImageryLayerCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, layer: Box<dyn ImageryLayer>) {
        self.layers.push(layer);
    }

    pub fn with_layer(mut self, layer: Box<dyn ImageryLayer>) -> Self {
        self.add(layer);
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&dyn ImageryLayer> {
        self.layers.get(index).map(|layer| layer.as_ref())
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut (dyn ImageryLayer + 'static)> {
        self.layers.get_mut(index).map(|layer| layer.as_mut())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn ImageryLayer>> {
        self.layers.iter_mut()
    }
}

impl std::fmt::Debug for ImageryLayerCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageryLayerCollection")
            .field("len", &self.layers.len())
            .finish()
    }
}
