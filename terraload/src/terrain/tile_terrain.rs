//! One attempt at producing terrain geometry for a tile.
//!
//! An attempt either loads data from the [`TerrainProvider`] or derives it
//! from an ancestor's data by upsampling. Both flavors then share the same
//! tail: build a mesh, upload it, publish it to the tile.
//!
//! ```text
//! load:      Unloaded ─request─► Receiving ─decode─► Received
//! upsample:  Unloaded ─upsample─► Receiving ───────► Received
//!
//! Received ─create_mesh─► Transforming ─► Transformed ─vertex array─► Ready
//! ```
//!
//! Any stage can end in `Failed`. A load whose request is rejected by the
//! scheduler, or cancelled while in flight, drops back to `Unloaded` and is
//! retried on the next tick. Deferred work (`None` from the data) leaves the
//! state unchanged.

use super::error::{TerrainError, TerrainResult};
use super::mesh::{MeshSummary, TerrainMesh};
use super::provider::{TerrainData, TerrainProvider};
use super::state::TerrainState;
use crate::coord::TilingScheme;
use crate::poll::poll_slot;
use crate::render::{RenderContext, VertexArrayHandle};
use crate::request::{RequestHandle, RequestScheduler, RequestStatus};
use crate::tile::{Tile, TileKey};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

type DataFuture = BoxFuture<'static, TerrainResult<Arc<dyn TerrainData>>>;
type MeshFuture = BoxFuture<'static, TerrainResult<TerrainMesh>>;

/// Ancestor data an upsample attempt derives from.
#[derive(Debug, Clone)]
pub struct UpsampleSource {
    pub data: Arc<dyn TerrainData>,
    pub key: TileKey,
}

/// A terrain attempt and the resources it has produced so far.
pub struct TileTerrain {
    state: TerrainState,
    upsample_source: Option<UpsampleSource>,
    data: Option<Arc<dyn TerrainData>>,
    request: Option<RequestHandle>,
    pending_data: Option<DataFuture>,
    pending_mesh: Option<MeshFuture>,
    mesh_summary: Option<MeshSummary>,
    mesh: Option<TerrainMesh>,
    vertex_array: Option<VertexArrayHandle>,
}

impl TileTerrain {
    /// An attempt that fetches the tile's own data.
    pub fn load() -> Self {
        Self::with_source(None)
    }

    /// An attempt that derives the tile's data from `source`.
    pub fn upsample(source: UpsampleSource) -> Self {
        Self::with_source(Some(source))
    }

    fn with_source(upsample_source: Option<UpsampleSource>) -> Self {
        Self {
            state: TerrainState::Unloaded,
            upsample_source,
            data: None,
            request: None,
            pending_data: None,
            pending_mesh: None,
            mesh_summary: None,
            mesh: None,
            vertex_array: None,
        }
    }

    pub fn state(&self) -> TerrainState {
        self.state
    }

    /// Decoded or upsampled data, once the attempt reached `Received`.
    pub fn data(&self) -> Option<&Arc<dyn TerrainData>> {
        self.data.as_ref()
    }

    pub fn upsample_source(&self) -> Option<&UpsampleSource> {
        self.upsample_source.as_ref()
    }

    pub fn is_upsample(&self) -> bool {
        self.upsample_source.is_some()
    }

    /// True while waiting on the network, the upsampler or the mesh builder.
    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    /// Advances a load attempt as far as it can go this tick.
    pub fn process_load_state_machine(
        &mut self,
        context: &mut dyn RenderContext,
        provider: &dyn TerrainProvider,
        tiling_scheme: &dyn TilingScheme,
        key: TileKey,
        scheduler: &mut RequestScheduler,
    ) {
        if self.state == TerrainState::Unloaded {
            self.request_from_provider(provider, key, scheduler);
        }
        if self.state == TerrainState::Receiving {
            self.poll_response(provider, key);
        }
        self.process_mesh_stages(context, tiling_scheme, key);
    }

    /// Advances an upsample attempt as far as it can go this tick.
    pub fn process_upsample_state_machine(
        &mut self,
        context: &mut dyn RenderContext,
        tiling_scheme: &dyn TilingScheme,
        key: TileKey,
    ) {
        if self.state == TerrainState::Unloaded {
            self.start_upsample(tiling_scheme, key);
        }
        if self.state == TerrainState::Receiving {
            if let Some(result) = poll_slot(&mut self.pending_data) {
                self.finish_receiving(key, result);
            }
        }
        self.process_mesh_stages(context, tiling_scheme, key);
    }

    /// Moves the uploaded vertex array and mesh summary into `tile`.
    ///
    /// A vertex array the tile already held is destroyed.
    pub fn publish_to_tile(&mut self, tile: &mut Tile, context: &mut dyn RenderContext) {
        let Some(vertex_array) = self.vertex_array.take() else {
            return;
        };
        if let Some(previous) = tile.vertex_array.replace(vertex_array) {
            context.destroy_vertex_array(previous);
        }
        tile.mesh_summary = self.mesh_summary;
    }

    /// Drops everything this attempt holds and resets it to `Unloaded`.
    ///
    /// An outstanding request is flagged for cancellation.
    pub fn free_resources(&mut self, context: &mut dyn RenderContext) {
        self.state = TerrainState::Unloaded;
        self.data = None;
        self.mesh = None;
        self.mesh_summary = None;
        self.pending_data = None;
        self.pending_mesh = None;
        if let Some(request) = self.request.take() {
            request.cancel();
        }
        if let Some(vertex_array) = self.vertex_array.take() {
            context.destroy_vertex_array(vertex_array);
        }
    }

    // =========================================================================
    // Stages
    // =========================================================================

    fn request_from_provider(
        &mut self,
        provider: &dyn TerrainProvider,
        key: TileKey,
        scheduler: &mut RequestScheduler,
    ) {
        match provider.request_tile_geometry(key, scheduler) {
            Some(request) => {
                debug!(tile = %key, url = request.url(), "Terrain request issued");
                self.request = Some(request);
                self.state = TerrainState::Receiving;
            }
            None => {
                debug!(tile = %key, "Terrain request throttled, retrying next tick");
            }
        }
    }

    fn poll_response(&mut self, provider: &dyn TerrainProvider, key: TileKey) {
        let Some(request) = &self.request else {
            self.state = TerrainState::Unloaded;
            return;
        };
        match request.poll() {
            RequestStatus::Pending => {}
            RequestStatus::Received(body) => {
                self.request = None;
                let result = provider.decode_tile_geometry(key, body);
                self.finish_receiving(key, result);
            }
            RequestStatus::Failed(err) => {
                self.request = None;
                self.fail(key, TerrainError::Fetch(err));
            }
            RequestStatus::Cancelled => {
                debug!(tile = %key, "Terrain request cancelled, retrying next tick");
                self.request = None;
                self.state = TerrainState::Unloaded;
            }
        }
    }

    fn start_upsample(&mut self, tiling_scheme: &dyn TilingScheme, key: TileKey) {
        let Some(source) = &self.upsample_source else {
            self.fail(
                key,
                TerrainError::Upsample("attempt has no source data".to_string()),
            );
            return;
        };
        if let Some(future) = source.data.upsample(tiling_scheme, source.key, key) {
            debug!(tile = %key, source = %source.key, "Upsampling terrain");
            self.pending_data = Some(future);
            self.state = TerrainState::Receiving;
        }
    }

    fn finish_receiving(&mut self, key: TileKey, result: TerrainResult<Arc<dyn TerrainData>>) {
        match result {
            Ok(data) => {
                debug!(
                    tile = %key,
                    upsampled = data.was_created_by_upsampling(),
                    "Terrain data received"
                );
                self.data = Some(data);
                self.state = TerrainState::Received;
            }
            Err(err) => self.fail(key, err),
        }
    }

    fn process_mesh_stages(
        &mut self,
        context: &mut dyn RenderContext,
        tiling_scheme: &dyn TilingScheme,
        key: TileKey,
    ) {
        if self.state == TerrainState::Received {
            if let Some(data) = &self.data {
                if let Some(future) = data.create_mesh(tiling_scheme, key) {
                    self.pending_mesh = Some(future);
                    self.state = TerrainState::Transforming;
                }
            }
        }
        if self.state == TerrainState::Transforming {
            match poll_slot(&mut self.pending_mesh) {
                Some(Ok(mesh)) => {
                    self.mesh = Some(mesh);
                    self.state = TerrainState::Transformed;
                }
                Some(Err(err)) => self.fail(key, err),
                None => {}
            }
        }
        if self.state == TerrainState::Transformed {
            if let Some(mesh) = self.mesh.take() {
                self.vertex_array = Some(context.create_vertex_array(&mesh));
                self.mesh_summary = Some(mesh.summary());
            }
            self.state = TerrainState::Ready;
            debug!(tile = %key, upsampled = self.is_upsample(), "Terrain ready");
        }
    }

    fn fail(&mut self, key: TileKey, err: TerrainError) {
        warn!(tile = %key, upsampled = self.is_upsample(), error = %err, "Terrain attempt failed");
        self.pending_data = None;
        self.pending_mesh = None;
        self.state = TerrainState::Failed;
    }
}

impl fmt::Debug for TileTerrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileTerrain")
            .field("state", &self.state)
            .field("upsample_source", &self.upsample_source.as_ref().map(|s| s.key))
            .field("has_data", &self.data.is_some())
            .field("vertex_array", &self.vertex_array)
            .finish()
    }
}
