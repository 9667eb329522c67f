//! Terrain meshes and the geometry summary tiles keep after upload.

use crate::coord::Cartesian3;
use bytes::Bytes;

/// A sphere enclosing a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingSphere {
    pub center: Cartesian3,
    pub radius: f64,
}

/// Geometry produced by [`TerrainData::create_mesh`](super::TerrainData::create_mesh).
///
/// `vertices` are interleaved floats in whatever layout the render context
/// expects, relative to `center`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TerrainMesh {
    pub center: Cartesian3,
    pub minimum_height: f64,
    pub maximum_height: f64,
    pub bounding_sphere: BoundingSphere,
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl TerrainMesh {
    pub fn summary(&self) -> MeshSummary {
        MeshSummary {
            center: self.center,
            minimum_height: self.minimum_height,
            maximum_height: self.maximum_height,
            bounding_sphere: self.bounding_sphere,
        }
    }
}

/// What a tile remembers about its published mesh (for culling and LOD).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeshSummary {
    pub center: Cartesian3,
    pub minimum_height: f64,
    pub maximum_height: f64,
    pub bounding_sphere: BoundingSphere,
}

/// A square land/water mask carried by terrain data.
///
/// Pixels are 0 for land and 255 for water. A 1x1 mask describes a tile
/// that is entirely one or the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaterMask {
    pub width: u32,
    pub height: u32,
    pub pixels: Bytes,
}

impl WaterMask {
    pub fn new(width: u32, height: u32, pixels: impl Into<Bytes>) -> Self {
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }

    /// A 1x1 mask of a single value.
    pub fn uniform(value: u8) -> Self {
        Self::new(1, 1, vec![value])
    }

    /// The single value of a 1x1 mask.
    pub fn uniform_value(&self) -> Option<u8> {
        if self.width == 1 && self.height == 1 {
            self.pixels.first().copied()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_value() {
        assert_eq!(WaterMask::uniform(0).uniform_value(), Some(0));
        assert_eq!(WaterMask::uniform(255).uniform_value(), Some(255));
        assert_eq!(WaterMask::new(2, 2, vec![0, 255, 0, 255]).uniform_value(), None);
    }

    #[test]
    fn test_summary_copies_geometry() {
        let mesh = TerrainMesh {
            center: Cartesian3::new(1.0, 2.0, 3.0),
            minimum_height: -5.0,
            maximum_height: 120.0,
            bounding_sphere: BoundingSphere {
                center: Cartesian3::new(1.0, 2.0, 3.0),
                radius: 50.0,
            },
            vertices: vec![0.0; 9],
            indices: vec![0, 1, 2],
        };
        let summary = mesh.summary();
        assert_eq!(summary.center, mesh.center);
        assert_eq!(summary.maximum_height, 120.0);
        assert_eq!(summary.bounding_sphere.radius, 50.0);
    }
}
