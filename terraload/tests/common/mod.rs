//! Shared mocks for the integration tests.

#![allow(dead_code)]

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use terraload::config::{SchedulerConfig, TileLoadConfig};
use terraload::coord::{GeographicTilingScheme, Rectangle, TilingScheme};
use terraload::imagery::{
    ImageryId, ImageryLayer, ImageryLayerCollection, ImageryState, TileImagery,
};
use terraload::render::{CountingRenderContext, RenderContext, TextureHandle};
use terraload::request::{
    FetchError, Request, RequestHandle, RequestScheduler, RequestType,
};
use terraload::terrain::{
    BoundingSphere, TerrainData, TerrainError, TerrainMesh, TerrainProvider, TerrainResult,
    WaterMask,
};
use terraload::tile::{TileKey, TileState, TileTree};

// =============================================================================
// Terrain
// =============================================================================

/// Knobs shared between a provider and the data it decodes.
#[derive(Debug, Default)]
pub struct TerrainSettings {
    /// Tiles whose data exists on the "server".
    pub available: Mutex<HashSet<TileKey>>,
    /// Explicit availability answers, overriding parent data.
    pub overrides: Mutex<HashMap<TileKey, bool>>,
    /// Tiles whose request fails.
    pub failing: Mutex<HashSet<TileKey>>,
    /// Water masks attached to loaded data.
    pub water_masks: Mutex<HashMap<TileKey, WaterMask>>,
    /// When set, upsampled data defers mesh creation.
    pub hold_upsampled_meshes: AtomicBool,
}

#[derive(Debug)]
pub struct MockTerrainData {
    key: TileKey,
    upsampled: bool,
    water_mask: Option<WaterMask>,
    settings: Arc<TerrainSettings>,
}

impl TerrainData for MockTerrainData {
    fn water_mask(&self) -> Option<&WaterMask> {
        self.water_mask.as_ref()
    }

    fn was_created_by_upsampling(&self) -> bool {
        self.upsampled
    }

    fn is_child_available(&self, _this_x: u32, _this_y: u32, child_x: u32, child_y: u32) -> bool {
        let child = TileKey::new(child_x, child_y, self.key.level + 1);
        self.settings.available.lock().contains(&child)
    }

    fn create_mesh(
        &self,
        _tiling_scheme: &dyn TilingScheme,
        key: TileKey,
    ) -> Option<BoxFuture<'static, TerrainResult<TerrainMesh>>> {
        if self.upsampled && self.settings.hold_upsampled_meshes.load(Ordering::SeqCst) {
            return None;
        }
        let mesh = TerrainMesh {
            minimum_height: 0.0,
            maximum_height: f64::from(key.level) * 10.0,
            bounding_sphere: BoundingSphere {
                radius: 1000.0,
                ..Default::default()
            },
            vertices: vec![0.0; 12],
            indices: vec![0, 1, 2, 0, 2, 3],
            ..Default::default()
        };
        Some(futures::future::ready(Ok(mesh)).boxed())
    }

    fn upsample(
        &self,
        _tiling_scheme: &dyn TilingScheme,
        _source: TileKey,
        target: TileKey,
    ) -> Option<BoxFuture<'static, TerrainResult<Arc<dyn TerrainData>>>> {
        let data: Arc<dyn TerrainData> = Arc::new(MockTerrainData {
            key: target,
            upsampled: true,
            water_mask: None,
            settings: Arc::clone(&self.settings),
        });
        Some(futures::future::ready(Ok(data)).boxed())
    }
}

#[derive(Debug, Clone)]
pub struct MockTerrainProvider {
    pub settings: Arc<TerrainSettings>,
    pub has_water_mask: bool,
}

impl MockTerrainProvider {
    /// A provider where `available` tiles exist.
    pub fn with_available(available: impl IntoIterator<Item = TileKey>) -> Self {
        let settings = TerrainSettings::default();
        settings.available.lock().extend(available);
        Self {
            settings: Arc::new(settings),
            has_water_mask: false,
        }
    }

    pub fn with_water_mask(mut self) -> Self {
        self.has_water_mask = true;
        self
    }

    pub fn set_water_mask(&self, key: TileKey, mask: WaterMask) {
        self.settings.water_masks.lock().insert(key, mask);
    }

    pub fn set_available(&self, key: TileKey, available: bool) {
        self.settings.overrides.lock().insert(key, available);
    }

    pub fn fail(&self, key: TileKey) {
        self.settings.failing.lock().insert(key);
    }
}

impl TerrainProvider for MockTerrainProvider {
    fn request_tile_geometry(
        &self,
        key: TileKey,
        scheduler: &mut RequestScheduler,
    ) -> Option<RequestHandle> {
        let url = format!("https://terrain.test/{}/{}/{}.terrain", key.level, key.x, key.y);
        let fails = self.settings.failing.lock().contains(&key);
        let request = Request::new(url, move || {
            let result = if fails {
                Err(FetchError::Http { status: 404 })
            } else {
                Ok(Bytes::from_static(b"terrain"))
            };
            futures::future::ready(result).boxed()
        })
        .with_throttle(true)
        .with_throttle_by_server(true)
        .with_request_type(RequestType::Terrain);
        scheduler.request(request)
    }

    fn decode_tile_geometry(
        &self,
        key: TileKey,
        body: Bytes,
    ) -> TerrainResult<Arc<dyn TerrainData>> {
        if body.is_empty() {
            return Err(TerrainError::Decode("empty body".to_string()));
        }
        Ok(Arc::new(MockTerrainData {
            key,
            upsampled: false,
            water_mask: self.settings.water_masks.lock().get(&key).cloned(),
            settings: Arc::clone(&self.settings),
        }))
    }

    fn has_water_mask(&self) -> bool {
        self.has_water_mask
    }

    fn tile_data_available(&self, key: TileKey) -> Option<bool> {
        self.settings.overrides.lock().get(&key).copied()
    }
}

// =============================================================================
// Imagery
// =============================================================================

#[derive(Debug, Default)]
pub struct LayerState {
    pub provider_ready: bool,
    pub failing: HashSet<TileKey>,
    pub states: HashMap<ImageryId, ImageryState>,
    pub owners: HashMap<ImageryId, TileKey>,
    pub textures: HashMap<ImageryId, TextureHandle>,
    pub released: Vec<ImageryId>,
    pub composed: Vec<(TileKey, TextureHandle)>,
    next_id: u64,
}

impl LayerState {
    pub fn imagery_of(&self, key: TileKey) -> Vec<ImageryId> {
        let mut ids: Vec<_> = self
            .owners
            .iter()
            .filter(|(_, owner)| **owner == key)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    pub fn composed_for(&self, key: TileKey) -> Option<TextureHandle> {
        self.composed
            .iter()
            .find(|(owner, _)| *owner == key)
            .map(|(_, texture)| *texture)
    }
}

/// One imagery per tile, fetched synchronously.
#[derive(Debug, Clone, Default)]
pub struct MockImageryLayer {
    pub state: Arc<Mutex<LayerState>>,
}

impl MockImageryLayer {
    pub fn ready() -> Self {
        let layer = Self::default();
        layer.state.lock().provider_ready = true;
        layer
    }

    pub fn not_ready() -> Self {
        Self::default()
    }

    pub fn fail(&self, key: TileKey) {
        self.state.lock().failing.insert(key);
    }
}

impl ImageryLayer for MockImageryLayer {
    fn show(&self) -> bool {
        true
    }

    fn is_provider_ready(&self) -> bool {
        self.state.lock().provider_ready
    }

    fn create_tile_imagery_skeletons(
        &mut self,
        key: TileKey,
        _rectangle: &Rectangle,
    ) -> Vec<TileImagery> {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = ImageryId(state.next_id);
        let initial = if state.provider_ready {
            ImageryState::Unloaded
        } else {
            ImageryState::Placeholder
        };
        state.states.insert(id, initial);
        state.owners.insert(id, key);
        vec![TileImagery::new(id)]
    }

    fn poll_imagery(&mut self, imagery: ImageryId) -> ImageryState {
        self.state
            .lock()
            .states
            .get(&imagery)
            .copied()
            .unwrap_or(ImageryState::Invalid)
    }

    fn request_imagery(&mut self, imagery: ImageryId, _scheduler: &mut RequestScheduler) {
        let mut state = self.state.lock();
        let fails = state
            .owners
            .get(&imagery)
            .is_some_and(|owner| state.failing.contains(owner));
        let next = if fails {
            ImageryState::Failed
        } else {
            ImageryState::Received
        };
        state.states.insert(imagery, next);
    }

    fn create_texture(&mut self, context: &mut dyn RenderContext, imagery: ImageryId) {
        let texture = context.create_texture(4, 4, &[0; 16]);
        let mut state = self.state.lock();
        state.textures.insert(imagery, texture);
        state.states.insert(imagery, ImageryState::Ready);
    }

    fn calculate_texture_translation_and_scale(
        &self,
        _key: TileKey,
        _rectangle: &Rectangle,
        _imagery: ImageryId,
    ) -> [f64; 4] {
        [0.0, 0.0, 1.0, 1.0]
    }

    fn compose_tile_texture(
        &mut self,
        context: &mut dyn RenderContext,
        key: TileKey,
        ready: &[TileImagery],
    ) -> Option<TextureHandle> {
        if ready.is_empty() {
            return None;
        }
        let texture = context.create_texture(4, 4, &[0; 16]);
        self.state.lock().composed.push((key, texture));
        Some(texture)
    }

    fn release_imagery(&mut self, context: &mut dyn RenderContext, imagery: ImageryId) {
        let mut state = self.state.lock();
        if let Some(texture) = state.textures.remove(&imagery) {
            context.destroy_texture(texture);
        }
        state.states.remove(&imagery);
        state.released.push(imagery);
    }
}

// =============================================================================
// Harness
// =============================================================================

pub fn root() -> TileKey {
    TileKey::new(0, 0, 0)
}

/// A tree plus everything needed to drive it.
pub struct Harness {
    pub tree: TileTree,
    pub scheduler: RequestScheduler,
    pub context: CountingRenderContext,
    pub provider: MockTerrainProvider,
    pub layers: ImageryLayerCollection,
}

impl Harness {
    pub fn new(provider: MockTerrainProvider) -> Self {
        let mut tree = TileTree::new(
            Arc::new(GeographicTilingScheme::new()),
            TileLoadConfig::default(),
        );
        tree.create_level_zero_tiles();
        Self {
            tree,
            scheduler: RequestScheduler::new(SchedulerConfig::default()),
            context: CountingRenderContext::new(),
            provider,
            layers: ImageryLayerCollection::new(),
        }
    }

    pub fn with_layer(mut self, layer: &MockImageryLayer) -> Self {
        self.layers.add(Box::new(layer.clone()));
        self
    }

    /// One frame: scheduler tick, then one state machine pass per tile.
    pub fn tick(&mut self, keys: &[TileKey]) {
        self.scheduler.update();
        for &key in keys {
            self.tree.process_state_machine(
                key,
                &mut self.context,
                &self.provider,
                &mut self.layers,
                &mut self.scheduler,
            );
        }
    }

    /// Ticks until every tile in `keys` is ready, up to `max_ticks`.
    pub fn run_until_ready(&mut self, keys: &[TileKey], max_ticks: usize) -> bool {
        for _ in 0..max_ticks {
            self.tick(keys);
            if keys.iter().all(|&key| self.state(key) == Some(TileState::Ready)) {
                return true;
            }
        }
        false
    }

    pub fn state(&self, key: TileKey) -> Option<TileState> {
        self.tree.get(key).map(|tile| tile.state())
    }

    pub fn children(&mut self, key: TileKey) -> [TileKey; 4] {
        self.tree.children(key).expect("children within max level")
    }

    pub fn free(&mut self, key: TileKey) {
        self.tree
            .free_resources(key, &mut self.context, &mut self.layers);
    }
}
