//! The tile quadtree and the per-tile load state machine.
//!
//! Tiles are stored in a flat arena keyed by [`TileKey`]. Parents and
//! children refer to each other by key, children are created on demand, and
//! freeing a tile drops its whole subtree from the arena.
//!
//! # Per-tick driving
//!
//! ```text
//! scheduler.update()
//! for each visible tile:
//!     tree.process_state_machine(key, ...)
//!         ├─ terrain:  loaded attempt, then upsampled attempt (unless the
//!         │            loaded one already has data)
//!         ├─ imagery:  every pending skeleton of every layer
//!         └─ readiness: renderable? done? failed?
//! ```
//!
//! Data published by a tile is pushed down to children that are still
//! waiting on it: they restart upsampling from the new data and, when it
//! says they have their own data, start a direct load.

use super::bounds::TileBounds;
use super::key::TileKey;
use super::node::{Tile, IDENTITY_TRANSLATION_AND_SCALE};
use super::state::TileState;
use super::water_mask::WaterMaskCache;
use crate::config::TileLoadConfig;
use crate::coord::{Rectangle, TilingScheme};
use crate::imagery::{
    ImageryLayer, ImageryLayerCollection, ImageryState, InheritedTexture, LayerImagery,
    TileImagery,
};
use crate::render::RenderContext;
use crate::request::RequestScheduler;
use crate::terrain::{
    TerrainData, TerrainProvider, TerrainState, TileTerrain, UpsampleSource, WaterMask,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Arena of tiles for one tiling scheme.
pub struct TileTree {
    tiling_scheme: Arc<dyn TilingScheme>,
    config: TileLoadConfig,
    tiles: HashMap<TileKey, Tile>,
    roots: Vec<TileKey>,
    water_masks: WaterMaskCache,
}

impl TileTree {
    pub fn new(tiling_scheme: Arc<dyn TilingScheme>, config: TileLoadConfig) -> Self {
        Self {
            tiling_scheme,
            config,
            tiles: HashMap::new(),
            roots: Vec::new(),
            water_masks: WaterMaskCache::new(),
        }
    }

    pub fn tiling_scheme(&self) -> &dyn TilingScheme {
        self.tiling_scheme.as_ref()
    }

    pub fn config(&self) -> &TileLoadConfig {
        &self.config
    }

    pub fn water_masks(&self) -> &WaterMaskCache {
        &self.water_masks
    }

    /// Number of tiles in the arena.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// True when the arena holds more tiles than the configured cache size.
    ///
    /// Choosing what to free is up to the caller.
    pub fn is_over_capacity(&self) -> bool {
        self.tiles.len() > self.config.tile_cache_size
    }

    pub fn roots(&self) -> &[TileKey] {
        &self.roots
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn get(&self, key: TileKey) -> Option<&Tile> {
        self.tiles.get(&key)
    }

    pub fn get_mut(&mut self, key: TileKey) -> Option<&mut Tile> {
        self.tiles.get_mut(&key)
    }

    pub fn parent(&self, key: TileKey) -> Option<&Tile> {
        self.tiles.get(&key)?.parent.and_then(|parent| self.tiles.get(&parent))
    }

    /// Tile counts per state.
    pub fn state_counts(&self) -> HashMap<TileState, usize> {
        let mut counts = HashMap::new();
        for tile in self.tiles.values() {
            *counts.entry(tile.state).or_insert(0) += 1;
        }
        counts
    }

    /// Creates the root tiles of the tiling scheme. Idempotent.
    pub fn create_level_zero_tiles(&mut self) -> &[TileKey] {
        if self.roots.is_empty() {
            let columns = self.tiling_scheme.number_of_x_tiles_at_level(0);
            let rows = self.tiling_scheme.number_of_y_tiles_at_level(0);
            for y in 0..rows {
                for x in 0..columns {
                    let key = TileKey::new(x, y, 0);
                    self.insert_tile(key, None);
                    self.roots.push(key);
                }
            }
            debug!(count = self.roots.len(), "Created level zero tiles");
        }
        &self.roots
    }

    /// The four children of `key`, created on first access.
    ///
    /// `None` for unknown tiles and tiles at the maximum level.
    pub fn children(&mut self, key: TileKey) -> Option<[TileKey; 4]> {
        if key.level >= self.config.max_level {
            return None;
        }
        let tile = self.tiles.get(&key)?;
        if let Some(children) = tile.children {
            return Some(children);
        }

        let children = key.children();
        for child in children {
            self.insert_tile(child, Some(key));
        }
        if let Some(tile) = self.tiles.get_mut(&key) {
            tile.children = Some(children);
        }
        Some(children)
    }

    fn insert_tile(&mut self, key: TileKey, parent: Option<TileKey>) {
        let rectangle = self
            .tiling_scheme
            .tile_xy_to_rectangle(key.x, key.y, key.level);
        self.tiles.insert(key, Tile::new(key, rectangle, parent));
    }

    // =========================================================================
    // Preparation
    // =========================================================================

    /// Sets up the terrain attempts, imagery skeletons and bounds of a tile
    /// in the `Start` state and moves it to `Loading`.
    pub fn prepare_new_tile(
        &mut self,
        key: TileKey,
        provider: &dyn TerrainProvider,
        layers: &mut ImageryLayerCollection,
    ) {
        let Some(tile) = self.tiles.get(&key) else {
            warn!(tile = %key, "Cannot prepare unknown tile");
            return;
        };
        if tile.state != TileState::Start {
            return;
        }
        let rectangle = tile.rectangle;

        let upsample_source = self.nearest_ancestor_with_data(key);
        let data_available = self.is_data_available(key, provider);
        let imagery: Vec<LayerImagery> = layers
            .iter_mut()
            .map(|layer| {
                if layer.show() {
                    LayerImagery::new(layer.create_tile_imagery_skeletons(key, &rectangle))
                } else {
                    LayerImagery::default()
                }
            })
            .collect();
        let bounds = TileBounds::compute(&rectangle, self.tiling_scheme.ellipsoid());

        let Some(tile) = self.tiles.get_mut(&key) else {
            return;
        };
        tile.upsampled_terrain = upsample_source.map(TileTerrain::upsample);
        tile.data_available = data_available;
        if data_available {
            tile.loaded_terrain = Some(TileTerrain::load());
        }
        tile.imagery = imagery;
        tile.bounds = Some(bounds);
        tile.state = TileState::Loading;

        debug!(
            tile = %key,
            load = data_available,
            upsample = tile.upsampled_terrain.is_some(),
            layers = tile.imagery.len(),
            "Prepared tile"
        );
    }

    fn nearest_ancestor_with_data(&self, key: TileKey) -> Option<UpsampleSource> {
        let mut current = self.tiles.get(&key)?.parent;
        while let Some(ancestor_key) = current {
            let ancestor = self.tiles.get(&ancestor_key)?;
            if let Some(data) = &ancestor.terrain_data {
                return Some(UpsampleSource {
                    data: Arc::clone(data),
                    key: ancestor_key,
                });
            }
            current = ancestor.parent;
        }
        None
    }

    /// Whether the provider has this tile's own data.
    ///
    /// The provider's explicit answer wins. Otherwise roots are available
    /// and other tiles ask their parent's data.
    fn is_data_available(&self, key: TileKey, provider: &dyn TerrainProvider) -> bool {
        if let Some(available) = provider.tile_data_available(key) {
            return available;
        }
        let Some(parent_key) = self.tiles.get(&key).and_then(|tile| tile.parent) else {
            return true;
        };
        self.tiles
            .get(&parent_key)
            .and_then(|parent| parent.terrain_data.as_ref())
            .is_some_and(|data| {
                data.is_child_available(parent_key.x, parent_key.y, key.x, key.y)
            })
    }

    // =========================================================================
    // State machine
    // =========================================================================

    /// Advances the tile one tick. Tiles still in `Start` are prepared first.
    pub fn process_state_machine(
        &mut self,
        key: TileKey,
        context: &mut dyn RenderContext,
        provider: &dyn TerrainProvider,
        layers: &mut ImageryLayerCollection,
        scheduler: &mut RequestScheduler,
    ) {
        let Some(state) = self.tiles.get(&key).map(Tile::state) else {
            return;
        };
        if state == TileState::Start {
            self.prepare_new_tile(key, provider, layers);
        }
        if self.tiles.get(&key).map(Tile::state) == Some(TileState::Loading) {
            self.process_terrain_state_machine(key, context, provider, scheduler);
        }
        self.process_imagery(key, context, layers, scheduler);
        self.update_readiness(key);
    }

    fn process_terrain_state_machine(
        &mut self,
        key: TileKey,
        context: &mut dyn RenderContext,
        provider: &dyn TerrainProvider,
        scheduler: &mut RequestScheduler,
    ) {
        self.check_late_availability(key, provider);

        let tiling_scheme = Arc::clone(&self.tiling_scheme);
        let Some(tile) = self.tiles.get_mut(&key) else {
            return;
        };
        let mut loaded = tile.loaded_terrain.take();
        let mut upsampled = tile.upsampled_terrain.take();
        let mut suspend_upsampling = false;

        if let Some(mut attempt) = loaded.take() {
            attempt.process_load_state_machine(
                context,
                provider,
                tiling_scheme.as_ref(),
                key,
                scheduler,
            );

            if attempt.state() >= TerrainState::Received {
                if let Some(data) = attempt.data().cloned() {
                    if self.publish_terrain_data(key, &data) {
                        if let Some(mask) = data.water_mask() {
                            self.attach_water_mask(key, context, mask);
                        }
                        self.propagate_to_children(key, context, provider, true);
                    }
                }
                suspend_upsampling = true;
            }

            match attempt.state() {
                TerrainState::Ready => {
                    if let Some(tile) = self.tiles.get_mut(&key) {
                        attempt.publish_to_tile(tile, context);
                    }
                    attempt.free_resources(context);
                    if let Some(mut stale) = upsampled.take() {
                        stale.free_resources(context);
                    }
                }
                TerrainState::Failed => attempt.free_resources(context),
                _ => loaded = Some(attempt),
            }
        }

        if !suspend_upsampling {
            if let Some(mut attempt) = upsampled.take() {
                attempt.process_upsample_state_machine(context, tiling_scheme.as_ref(), key);

                if attempt.state() >= TerrainState::Received {
                    if let Some(data) = attempt.data().cloned() {
                        if self.publish_terrain_data(key, &data) {
                            if provider.has_water_mask() {
                                self.upsample_water_mask(key, context);
                            }
                            self.propagate_to_children(key, context, provider, false);
                        }
                    }
                }

                match attempt.state() {
                    TerrainState::Ready => {
                        if let Some(tile) = self.tiles.get_mut(&key) {
                            attempt.publish_to_tile(tile, context);
                        }
                        attempt.free_resources(context);
                    }
                    TerrainState::Failed => attempt.free_resources(context),
                    _ => upsampled = Some(attempt),
                }
            }
        }

        if let Some(tile) = self.tiles.get_mut(&key) {
            tile.loaded_terrain = loaded;
            tile.upsampled_terrain = upsampled;
        }
    }

    /// Starts a direct load for a tile whose own data was unknown at
    /// preparation and has since become available.
    fn check_late_availability(&mut self, key: TileKey, provider: &dyn TerrainProvider) {
        let Some(tile) = self.tiles.get(&key) else {
            return;
        };
        if tile.data_available || tile.loaded_terrain.is_some() {
            return;
        }
        if !self.is_data_available(key, provider) {
            return;
        }
        if let Some(tile) = self.tiles.get_mut(&key) {
            debug!(tile = %key, "Tile data became available");
            tile.data_available = true;
            tile.loaded_terrain = Some(TileTerrain::load());
        }
    }

    /// Stores `data` on the tile. Returns false if it was already there.
    fn publish_terrain_data(&mut self, key: TileKey, data: &Arc<dyn TerrainData>) -> bool {
        let Some(tile) = self.tiles.get_mut(&key) else {
            return false;
        };
        if tile
            .terrain_data
            .as_ref()
            .is_some_and(|current| same_data(current, data))
        {
            return false;
        }
        tile.terrain_data = Some(Arc::clone(data));
        true
    }

    fn attach_water_mask(
        &mut self,
        key: TileKey,
        context: &mut dyn RenderContext,
        mask: &WaterMask,
    ) {
        let Self {
            tiles, water_masks, ..
        } = self;
        let Some(tile) = tiles.get_mut(&key) else {
            return;
        };
        if let Some(previous) = tile.water_mask.take() {
            water_masks.release(context, previous);
        }
        tile.water_mask = Some(water_masks.acquire(context, mask));
        tile.water_mask_translation_and_scale = IDENTITY_TRANSLATION_AND_SCALE;
    }

    /// Shares the water mask of the nearest ancestor with loaded data,
    /// mapped onto this tile's footprint.
    fn upsample_water_mask(&mut self, key: TileKey, context: &mut dyn RenderContext) {
        let Some(tile) = self.tiles.get(&key) else {
            return;
        };
        let rectangle = tile.rectangle;

        let mut current = tile.parent;
        let (source_key, source_rectangle) = loop {
            let Some(ancestor_key) = current else {
                return;
            };
            let Some(ancestor) = self.tiles.get(&ancestor_key) else {
                return;
            };
            let loaded = ancestor
                .terrain_data
                .as_ref()
                .is_some_and(|data| !data.was_created_by_upsampling());
            if loaded && ancestor.water_mask.is_some() {
                break (ancestor_key, ancestor.rectangle);
            }
            current = ancestor.parent;
        };

        let Self {
            tiles, water_masks, ..
        } = self;
        let Some(shared) = tiles
            .get(&source_key)
            .and_then(|source| source.water_mask.as_ref())
            .map(|handle| water_masks.share(handle))
        else {
            return;
        };
        let Some(tile) = tiles.get_mut(&key) else {
            water_masks.release(context, shared);
            return;
        };
        if let Some(previous) = tile.water_mask.replace(shared) {
            water_masks.release(context, previous);
        }
        tile.water_mask_translation_and_scale =
            rectangle.translation_and_scale_within(&source_rectangle);
    }

    /// Restarts children that are waiting for data from this tile.
    fn propagate_to_children(
        &mut self,
        key: TileKey,
        context: &mut dyn RenderContext,
        provider: &dyn TerrainProvider,
        loaded: bool,
    ) {
        let Some(tile) = self.tiles.get(&key) else {
            return;
        };
        let (Some(children), Some(data)) = (tile.children, tile.terrain_data.clone()) else {
            return;
        };

        for child_key in children {
            let available = loaded
                && provider.tile_data_available(child_key).unwrap_or_else(|| {
                    data.is_child_available(key.x, key.y, child_key.x, child_key.y)
                });

            let Some(child) = self.tiles.get_mut(&child_key) else {
                continue;
            };
            if child.state == TileState::Start {
                continue;
            }
            let waiting = child
                .terrain_data
                .as_ref()
                .map_or(true, |current| current.was_created_by_upsampling());
            if !waiting {
                continue;
            }

            if let Some(mut previous) = child.upsampled_terrain.take() {
                previous.free_resources(context);
            }
            child.upsampled_terrain = Some(TileTerrain::upsample(UpsampleSource {
                data: Arc::clone(&data),
                key,
            }));
            if available {
                child.data_available = true;
                if child.loaded_terrain.is_none() {
                    child.loaded_terrain = Some(TileTerrain::load());
                }
            }
            child.state = TileState::Loading;

            debug!(
                tile = %child_key,
                source = %key,
                load = child.loaded_terrain.is_some(),
                "Propagated terrain data to child"
            );
        }
    }

    fn process_imagery(
        &mut self,
        key: TileKey,
        context: &mut dyn RenderContext,
        layers: &mut ImageryLayerCollection,
        scheduler: &mut RequestScheduler,
    ) {
        let Some(tile) = self.tiles.get(&key) else {
            return;
        };
        if tile.imagery_done() {
            return;
        }
        let rectangle = tile.rectangle;
        let fallbacks: Vec<Option<InheritedTexture>> = (0..tile.imagery.len())
            .map(|index| self.ancestor_texture(key, &rectangle, index))
            .collect();

        let Some(tile) = self.tiles.get_mut(&key) else {
            return;
        };
        for ((layer_imagery, layer), fallback) in tile
            .imagery
            .iter_mut()
            .zip(layers.iter_mut())
            .zip(fallbacks)
        {
            if layer_imagery.is_done() {
                continue;
            }
            if layer_imagery.texture.is_none() {
                layer_imagery.inherited = fallback;
            }
            process_layer_imagery(
                key,
                &rectangle,
                layer_imagery,
                layer.as_mut(),
                context,
                scheduler,
            );
        }
    }

    /// The nearest ancestor texture composed for layer `index`.
    fn ancestor_texture(
        &self,
        key: TileKey,
        rectangle: &Rectangle,
        index: usize,
    ) -> Option<InheritedTexture> {
        let mut current = self.tiles.get(&key)?.parent;
        while let Some(ancestor_key) = current {
            let ancestor = self.tiles.get(&ancestor_key)?;
            if let Some(texture) = ancestor.imagery.get(index).and_then(|layer| layer.texture) {
                return Some(InheritedTexture {
                    texture,
                    source: ancestor_key,
                    translation_and_scale: rectangle
                        .translation_and_scale_within(&ancestor.rectangle),
                });
            }
            current = ancestor.parent;
        }
        None
    }

    fn update_readiness(&mut self, key: TileKey) {
        let ancestor_pending = self.ancestor_terrain_pending(key);
        let Some(tile) = self.tiles.get_mut(&key) else {
            return;
        };
        if tile.state != TileState::Loading {
            return;
        }

        let renderable = tile.vertex_array.is_some()
            && tile.imagery.iter().all(LayerImagery::is_renderable);
        let done = !tile.has_terrain_attempt() && tile.imagery_done();

        if renderable {
            tile.is_renderable = true;
            if done {
                tile.state = TileState::Ready;
                debug!(tile = %key, "Tile ready");
            }
        } else if !tile.has_terrain_attempt() && tile.vertex_array.is_none() && !ancestor_pending
        {
            tile.state = TileState::Failed;
            warn!(tile = %key, "No terrain available for tile");
        }
    }

    /// True if an ancestor may still publish data to this tile.
    fn ancestor_terrain_pending(&self, key: TileKey) -> bool {
        let mut current = self.tiles.get(&key).and_then(|tile| tile.parent);
        while let Some(ancestor_key) = current {
            let Some(ancestor) = self.tiles.get(&ancestor_key) else {
                return false;
            };
            if ancestor.state == TileState::Loading && ancestor.has_terrain_attempt() {
                return true;
            }
            current = ancestor.parent;
        }
        false
    }

    /// False while the tile is waiting on the network, the upsampler, the
    /// mesh builder or a texture upload.
    pub fn eligible_for_unloading(
        &self,
        key: TileKey,
        layers: &mut ImageryLayerCollection,
    ) -> bool {
        let Some(tile) = self.tiles.get(&key) else {
            return false;
        };
        let terrain_busy = tile.loaded_terrain.as_ref().is_some_and(TileTerrain::is_busy)
            || tile
                .upsampled_terrain
                .as_ref()
                .is_some_and(TileTerrain::is_busy);
        if terrain_busy {
            return false;
        }

        for (layer_imagery, layer) in tile.imagery.iter().zip(layers.iter_mut()) {
            for imagery in layer_imagery.skeletons.iter().filter_map(|s| s.imagery) {
                if layer.poll_imagery(imagery) == ImageryState::Transitioning {
                    return false;
                }
            }
        }
        true
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Releases everything the tile and its subtree hold and returns the tile
    /// to `Start`. Descendants are removed from the arena.
    pub fn free_resources(
        &mut self,
        key: TileKey,
        context: &mut dyn RenderContext,
        layers: &mut ImageryLayerCollection,
    ) {
        let Some(tile) = self.tiles.get_mut(&key) else {
            return;
        };
        if let Some(children) = tile.children.take() {
            for child in children {
                self.free_resources(child, context, layers);
                self.tiles.remove(&child);
            }
        }

        let Self {
            tiles, water_masks, ..
        } = self;
        let Some(tile) = tiles.get_mut(&key) else {
            return;
        };

        if let Some(mask) = tile.water_mask.take() {
            water_masks.release(context, mask);
        }
        tile.water_mask_translation_and_scale = IDENTITY_TRANSLATION_AND_SCALE;

        tile.state = TileState::Start;
        tile.is_renderable = false;
        tile.terrain_data = None;
        tile.data_available = false;

        if let Some(mut attempt) = tile.loaded_terrain.take() {
            attempt.free_resources(context);
        }
        if let Some(mut attempt) = tile.upsampled_terrain.take() {
            attempt.free_resources(context);
        }

        for (layer_imagery, layer) in tile.imagery.drain(..).zip(layers.iter_mut()) {
            for imagery in layer_imagery.skeletons.iter().filter_map(|s| s.imagery) {
                layer.release_imagery(context, imagery);
            }
            if let Some(texture) = layer_imagery.texture {
                context.destroy_texture(texture);
            }
        }

        if let Some(vertex_array) = tile.vertex_array.take() {
            context.destroy_vertex_array(vertex_array);
        }
        tile.mesh_summary = None;
        tile.bounds = None;

        debug!(tile = %key, "Freed tile resources");
    }

    /// Frees every tile and the shared water mask textures.
    pub fn destroy(&mut self, context: &mut dyn RenderContext, layers: &mut ImageryLayerCollection) {
        for root in std::mem::take(&mut self.roots) {
            self.free_resources(root, context, layers);
        }
        self.tiles.clear();
        self.water_masks.destroy(context);
    }
}

/// Drives every pending skeleton of one layer and finishes the layer once
/// all of them are terminal.
fn process_layer_imagery(
    key: TileKey,
    rectangle: &Rectangle,
    imagery: &mut LayerImagery,
    layer: &mut dyn ImageryLayer,
    context: &mut dyn RenderContext,
    scheduler: &mut RequestScheduler,
) {
    let mut done = true;
    let mut use_parent = true;

    let mut index = 0;
    while index < imagery.skeletons.len() {
        let Some(id) = imagery.skeletons[index].imagery else {
            index += 1;
            continue;
        };

        let mut state = layer.poll_imagery(id);
        if state == ImageryState::Placeholder {
            if layer.is_provider_ready() {
                layer.release_imagery(context, id);
                let replacements = layer.create_tile_imagery_skeletons(key, rectangle);
                let tail = imagery.skeletons.split_off(index + 1);
                imagery.skeletons.truncate(index);
                imagery.skeletons.extend(replacements);
                imagery.skeletons.extend(tail);
                continue;
            }
            done = false;
            use_parent = false;
            index += 1;
            continue;
        }

        if state == ImageryState::Unloaded {
            layer.request_imagery(id, scheduler);
            state = layer.poll_imagery(id);
        }
        if state == ImageryState::Received {
            layer.create_texture(context, id);
            state = layer.poll_imagery(id);
        }
        let skeleton = &mut imagery.skeletons[index];
        if state == ImageryState::Ready && skeleton.texture_translation_and_scale.is_none() {
            skeleton.texture_translation_and_scale =
                Some(layer.calculate_texture_translation_and_scale(key, rectangle, id));
        }

        done &= state.is_terminal();
        use_parent &= state.is_unusable();
        index += 1;
    }

    if done {
        finish_layer_imagery(key, imagery, layer, context, use_parent);
    }
}

fn finish_layer_imagery(
    key: TileKey,
    imagery: &mut LayerImagery,
    layer: &mut dyn ImageryLayer,
    context: &mut dyn RenderContext,
    use_parent: bool,
) {
    let skeletons = std::mem::take(&mut imagery.skeletons);
    let mut ready = Vec::new();
    let mut missing = Vec::new();

    for skeleton in skeletons {
        match skeleton.imagery {
            Some(id) if !use_parent && layer.poll_imagery(id) == ImageryState::Ready => {
                ready.push(skeleton);
            }
            Some(id) => {
                layer.release_imagery(context, id);
                missing.push(TileImagery {
                    imagery: None,
                    ..skeleton
                });
            }
            None => missing.push(skeleton),
        }
    }

    if !ready.is_empty() {
        imagery.texture = layer.compose_tile_texture(context, key, &ready);
        for id in ready.iter().filter_map(|skeleton| skeleton.imagery) {
            layer.release_imagery(context, id);
        }
    }
    if imagery.texture.is_some() && missing.is_empty() {
        imagery.inherited = None;
    }

    debug!(
        tile = %key,
        composed = imagery.texture.is_some(),
        inherited = imagery.inherited.is_some(),
        missing = missing.len(),
        "Layer imagery finished"
    );
    imagery.missing = missing;
}

fn same_data(a: &Arc<dyn TerrainData>, b: &Arc<dyn TerrainData>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl fmt::Debug for TileTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileTree")
            .field("tiles", &self.tiles.len())
            .field("roots", &self.roots)
            .field("water_masks", &self.water_masks.len())
            .finish()
    }
}
