//! Procedural terrain served through the scheduler with artificial latency.

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use terraload::coord::{Cartesian3, Cartographic, TilingScheme};
use terraload::request::{FetchResult, Request, RequestHandle, RequestScheduler, RequestType};
use terraload::terrain::{
    BoundingSphere, TerrainData, TerrainMesh, TerrainProvider, TerrainResult, WaterMask,
};
use terraload::tile::{TileKey, LAND, WATER};

/// Grid vertices per tile edge.
const GRID_SIZE: u32 = 5;

/// A transport that answers after a fixed number of polls.
///
/// The scheduler polls active requests once per frame, so `frames` is the
/// latency in frames.
pub struct Delayed {
    frames: u32,
    body: Option<Bytes>,
}

impl Delayed {
    pub fn new(frames: u32, body: Bytes) -> Self {
        Self {
            frames,
            body: Some(body),
        }
    }
}

impl Future for Delayed {
    type Output = FetchResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.frames == 0 {
            return Poll::Ready(Ok(self.body.take().unwrap_or_default()));
        }
        self.frames -= 1;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// Provider with real data down to `data_levels` and upsampling below.
#[derive(Debug, Clone)]
pub struct SyntheticTerrainProvider {
    latency: u32,
    data_levels: u32,
}

impl SyntheticTerrainProvider {
    pub fn new(latency: u32, data_levels: u32) -> Self {
        Self {
            latency,
            data_levels,
        }
    }
}

impl TerrainProvider for SyntheticTerrainProvider {
    fn request_tile_geometry(
        &self,
        key: TileKey,
        scheduler: &mut RequestScheduler,
    ) -> Option<RequestHandle> {
        let url = format!(
            "https://terrain.synthetic.test/{}/{}/{}.terrain",
            key.level, key.x, key.y
        );
        let latency = self.latency;
        let request = Request::new(url, move || {
            Delayed::new(latency, Bytes::from_static(b"heightmap")).boxed()
        })
        .with_priority(f64::from(key.level))
        .with_throttle(true)
        .with_throttle_by_server(true)
        .with_request_type(RequestType::Terrain);
        scheduler.request(request)
    }

    fn decode_tile_geometry(
        &self,
        key: TileKey,
        _body: Bytes,
    ) -> TerrainResult<Arc<dyn TerrainData>> {
        Ok(Arc::new(SyntheticTerrain {
            key,
            data_levels: self.data_levels,
            upsampled: false,
            water_mask: Some(water_mask_for(key)),
        }))
    }

    fn has_water_mask(&self) -> bool {
        true
    }
}

/// Heights computed from position; identical whether loaded or upsampled.
#[derive(Debug)]
pub struct SyntheticTerrain {
    key: TileKey,
    data_levels: u32,
    upsampled: bool,
    water_mask: Option<WaterMask>,
}

impl TerrainData for SyntheticTerrain {
    fn water_mask(&self) -> Option<&WaterMask> {
        self.water_mask.as_ref()
    }

    fn was_created_by_upsampling(&self) -> bool {
        self.upsampled
    }

    fn is_child_available(&self, _this_x: u32, _this_y: u32, _child_x: u32, _child_y: u32) -> bool {
        self.key.level < self.data_levels
    }

    fn create_mesh(
        &self,
        tiling_scheme: &dyn TilingScheme,
        key: TileKey,
    ) -> Option<BoxFuture<'static, TerrainResult<TerrainMesh>>> {
        let mesh = build_mesh(tiling_scheme, key);
        Some(futures::future::ready(Ok(mesh)).boxed())
    }

    fn upsample(
        &self,
        _tiling_scheme: &dyn TilingScheme,
        _source: TileKey,
        target: TileKey,
    ) -> Option<BoxFuture<'static, TerrainResult<Arc<dyn TerrainData>>>> {
        let data: Arc<dyn TerrainData> = Arc::new(SyntheticTerrain {
            key: target,
            data_levels: self.data_levels,
            upsampled: true,
            water_mask: None,
        });
        Some(futures::future::ready(Ok(data)).boxed())
    }
}

fn height_at(longitude: f64, latitude: f64) -> f64 {
    1500.0 + 1500.0 * (3.0 * longitude).sin() * (2.0 * latitude).cos()
}

fn build_mesh(tiling_scheme: &dyn TilingScheme, key: TileKey) -> TerrainMesh {
    let rectangle = tiling_scheme.tile_xy_to_rectangle(key.x, key.y, key.level);
    let ellipsoid = tiling_scheme.ellipsoid();
    let step = f64::from(GRID_SIZE - 1);

    let mut positions = Vec::with_capacity((GRID_SIZE * GRID_SIZE) as usize);
    let mut minimum_height = f64::MAX;
    let mut maximum_height = f64::MIN;
    for row in 0..GRID_SIZE {
        let latitude = rectangle.north - rectangle.height() * f64::from(row) / step;
        for column in 0..GRID_SIZE {
            let longitude = rectangle.west + rectangle.width() * f64::from(column) / step;
            let height = height_at(longitude, latitude);
            minimum_height = minimum_height.min(height);
            maximum_height = maximum_height.max(height);
            positions.push(
                ellipsoid.cartographic_to_cartesian(Cartographic::new(longitude, latitude, height)),
            );
        }
    }

    let center = ellipsoid.cartographic_to_cartesian(rectangle.center());
    let radius = positions
        .iter()
        .map(|position| position.distance(center))
        .fold(0.0, f64::max);

    let vertices = positions
        .iter()
        .flat_map(|position| {
            let relative: Cartesian3 = *position - center;
            [relative.x as f32, relative.y as f32, relative.z as f32]
        })
        .collect();

    let mut indices = Vec::new();
    for row in 0..GRID_SIZE - 1 {
        for column in 0..GRID_SIZE - 1 {
            let nw = row * GRID_SIZE + column;
            let ne = nw + 1;
            let sw = nw + GRID_SIZE;
            let se = sw + 1;
            indices.extend_from_slice(&[nw, sw, ne, ne, sw, se]);
        }
    }

    TerrainMesh {
        center,
        minimum_height,
        maximum_height,
        bounding_sphere: BoundingSphere { center, radius },
        vertices,
        indices,
    }
}

/// Mostly uniform tiles with the occasional coastline.
fn water_mask_for(key: TileKey) -> WaterMask {
    if (key.x + key.y) % 3 == 0 {
        let pixels: Vec<u8> = (0..16)
            .map(|i| if (i / 4 + i % 4) % 2 == 0 { WATER } else { LAND })
            .collect();
        WaterMask::new(4, 4, pixels)
    } else if key.x % 2 == 0 {
        WaterMask::uniform(WATER)
    } else {
        WaterMask::uniform(LAND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::task::noop_waker_ref;
    use terraload::coord::GeographicTilingScheme;

    #[test]
    fn test_delayed_answers_after_frames() {
        let mut future = Delayed::new(2, Bytes::from_static(b"x"));
        let mut cx = Context::from_waker(noop_waker_ref());

        assert!(Pin::new(&mut future).poll(&mut cx).is_pending());
        assert!(Pin::new(&mut future).poll(&mut cx).is_pending());
        assert_eq!(
            Pin::new(&mut future).poll(&mut cx),
            Poll::Ready(Ok(Bytes::from_static(b"x")))
        );
    }

    #[test]
    fn test_mesh_grid_shape() {
        let scheme = GeographicTilingScheme::new();
        let mesh = build_mesh(&scheme, TileKey::new(1, 1, 2));

        assert_eq!(mesh.vertices.len(), (GRID_SIZE * GRID_SIZE * 3) as usize);
        assert_eq!(mesh.indices.len(), ((GRID_SIZE - 1) * (GRID_SIZE - 1) * 6) as usize);
        assert!(mesh.minimum_height <= mesh.maximum_height);
        assert!(mesh.bounding_sphere.radius > 0.0);
    }

    #[test]
    fn test_children_available_only_above_data_levels() {
        let data = SyntheticTerrain {
            key: TileKey::new(0, 0, 2),
            data_levels: 3,
            upsampled: false,
            water_mask: None,
        };
        assert!(data.is_child_available(0, 0, 0, 0));

        let deepest = SyntheticTerrain {
            key: TileKey::new(0, 0, 3),
            ..data
        };
        assert!(!deepest.is_child_available(0, 0, 0, 0));
    }
}
