//! GPU resource seam.
//!
//! The tile pipeline never touches a graphics API. It asks a
//! [`RenderContext`] to create and destroy textures and vertex arrays and
//! keeps the returned opaque handles. Handles are plain identifiers: copying
//! one does not duplicate the resource, so each handle is destroyed exactly
//! once by whoever owns it.

use crate::terrain::TerrainMesh;
use std::collections::HashSet;
use std::fmt;

/// Opaque identifier of a texture owned by a [`RenderContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

impl fmt::Display for TextureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "texture#{}", self.0)
    }
}

/// Opaque identifier of a vertex array owned by a [`RenderContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayHandle(pub u64);

impl fmt::Display for VertexArrayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vertex-array#{}", self.0)
    }
}

/// Creates and destroys the GPU resources tiles hold.
pub trait RenderContext {
    /// Uploads a single-channel texture of `width * height` bytes.
    fn create_texture(&mut self, width: u32, height: u32, pixels: &[u8]) -> TextureHandle;

    fn destroy_texture(&mut self, texture: TextureHandle);

    /// Uploads a terrain mesh.
    fn create_vertex_array(&mut self, mesh: &TerrainMesh) -> VertexArrayHandle;

    fn destroy_vertex_array(&mut self, vertex_array: VertexArrayHandle);
}

/// A context that hands out sequential handles and tracks what is alive.
///
/// Used by the CLI simulator and handy for tests that only care about
/// resource lifetimes.
#[derive(Debug, Default)]
pub struct CountingRenderContext {
    next_id: u64,
    live_textures: HashSet<TextureHandle>,
    live_vertex_arrays: HashSet<VertexArrayHandle>,
    textures_created: usize,
    vertex_arrays_created: usize,
}

impl CountingRenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_textures(&self) -> usize {
        self.live_textures.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.live_vertex_arrays.len()
    }

    pub fn is_texture_alive(&self, texture: TextureHandle) -> bool {
        self.live_textures.contains(&texture)
    }

    pub fn textures_created(&self) -> usize {
        self.textures_created
    }

    pub fn vertex_arrays_created(&self) -> usize {
        self.vertex_arrays_created
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl RenderContext for CountingRenderContext {
    fn create_texture(&mut self, _width: u32, _height: u32, _pixels: &[u8]) -> TextureHandle {
        let texture = TextureHandle(self.next());
        self.live_textures.insert(texture);
        self.textures_created += 1;
        texture
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        if !self.live_textures.remove(&texture) {
            tracing::warn!(%texture, "Destroying a texture that is not alive");
        }
    }

    fn create_vertex_array(&mut self, _mesh: &TerrainMesh) -> VertexArrayHandle {
        let vertex_array = VertexArrayHandle(self.next());
        self.live_vertex_arrays.insert(vertex_array);
        self.vertex_arrays_created += 1;
        vertex_array
    }

    fn destroy_vertex_array(&mut self, vertex_array: VertexArrayHandle) {
        if !self.live_vertex_arrays.remove(&vertex_array) {
            tracing::warn!(%vertex_array, "Destroying a vertex array that is not alive");
        }
    }
}
