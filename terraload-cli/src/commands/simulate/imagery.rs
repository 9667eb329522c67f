//! Procedural imagery: one image per tile, fetched through the scheduler.

use bytes::Bytes;
use futures::FutureExt;
use std::collections::HashMap;
use terraload::coord::Rectangle;
use terraload::imagery::{ImageryId, ImageryLayer, ImageryState, TileImagery};
use terraload::render::{RenderContext, TextureHandle};
use terraload::request::{Request, RequestHandle, RequestScheduler, RequestStatus, RequestType};
use terraload::tile::TileKey;

use super::terrain::Delayed;

/// Size of the fake image each request returns.
const IMAGE_SIZE: u32 = 256;

#[derive(Debug)]
struct Imagery {
    key: TileKey,
    rectangle: Rectangle,
    state: ImageryState,
    request: Option<RequestHandle>,
    texture: Option<TextureHandle>,
}

#[derive(Debug, Default)]
pub struct SyntheticImageryLayer {
    latency: u32,
    imagery: HashMap<ImageryId, Imagery>,
    next_id: u64,
}

impl SyntheticImageryLayer {
    pub fn new(latency: u32) -> Self {
        Self {
            latency,
            ..Default::default()
        }
    }

    /// Imagery still held by tiles.
    pub fn live_imagery(&self) -> usize {
        self.imagery.len()
    }
}

impl ImageryLayer for SyntheticImageryLayer {
    fn show(&self) -> bool {
        true
    }

    fn is_provider_ready(&self) -> bool {
        true
    }

    fn create_tile_imagery_skeletons(
        &mut self,
        key: TileKey,
        rectangle: &Rectangle,
    ) -> Vec<TileImagery> {
        self.next_id += 1;
        let id = ImageryId(self.next_id);
        self.imagery.insert(
            id,
            Imagery {
                key,
                rectangle: *rectangle,
                state: ImageryState::Unloaded,
                request: None,
                texture: None,
            },
        );
        vec![TileImagery::new(id)]
    }

    fn poll_imagery(&mut self, imagery: ImageryId) -> ImageryState {
        let Some(entry) = self.imagery.get_mut(&imagery) else {
            return ImageryState::Invalid;
        };
        if entry.state == ImageryState::Transitioning {
            if let Some(request) = &entry.request {
                match request.poll() {
                    RequestStatus::Pending => {}
                    RequestStatus::Received(_) => {
                        entry.request = None;
                        entry.state = ImageryState::Received;
                    }
                    RequestStatus::Failed(e) => {
                        tracing::warn!(tile = %entry.key, error = %e, "Imagery request failed");
                        entry.request = None;
                        entry.state = ImageryState::Failed;
                    }
                    RequestStatus::Cancelled => {
                        entry.request = None;
                        entry.state = ImageryState::Unloaded;
                    }
                }
            }
        }
        entry.state
    }

    fn request_imagery(&mut self, imagery: ImageryId, scheduler: &mut RequestScheduler) {
        let Some(entry) = self.imagery.get_mut(&imagery) else {
            return;
        };
        let key = entry.key;
        let url = format!(
            "https://imagery.synthetic.test/{}/{}/{}.png",
            key.level, key.x, key.y
        );
        let latency = self.latency;
        let request = Request::new(url, move || {
            Delayed::new(latency, Bytes::from_static(b"png")).boxed()
        })
        .with_priority(f64::from(key.level))
        .with_throttle(true)
        .with_throttle_by_server(true)
        .with_request_type(RequestType::Imagery);

        if let Some(handle) = scheduler.request(request) {
            entry.request = Some(handle);
            entry.state = ImageryState::Transitioning;
        }
    }

    fn create_texture(&mut self, context: &mut dyn RenderContext, imagery: ImageryId) {
        let Some(entry) = self.imagery.get_mut(&imagery) else {
            return;
        };
        let shade = (entry.key.level * 32).min(255) as u8;
        entry.texture = Some(context.create_texture(1, 1, &[shade, shade, shade, 255]));
        entry.state = ImageryState::Ready;
    }

    fn calculate_texture_translation_and_scale(
        &self,
        _key: TileKey,
        rectangle: &Rectangle,
        imagery: ImageryId,
    ) -> [f64; 4] {
        match self.imagery.get(&imagery) {
            Some(entry) => entry.rectangle.translation_and_scale_within(rectangle),
            None => [0.0, 0.0, 1.0, 1.0],
        }
    }

    fn compose_tile_texture(
        &mut self,
        context: &mut dyn RenderContext,
        _key: TileKey,
        ready: &[TileImagery],
    ) -> Option<TextureHandle> {
        if ready.is_empty() {
            return None;
        }
        Some(context.create_texture(IMAGE_SIZE, IMAGE_SIZE, &[]))
    }

    fn release_imagery(&mut self, context: &mut dyn RenderContext, imagery: ImageryId) {
        let Some(entry) = self.imagery.remove(&imagery) else {
            return;
        };
        if let Some(request) = entry.request {
            request.cancel();
        }
        if let Some(texture) = entry.texture {
            context.destroy_texture(texture);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terraload::config::SchedulerConfig;
    use terraload::render::CountingRenderContext;

    #[test]
    fn test_imagery_lifecycle() {
        let mut layer = SyntheticImageryLayer::new(0);
        let mut scheduler = RequestScheduler::new(SchedulerConfig::default());
        let mut context = CountingRenderContext::new();
        let key = TileKey::new(0, 0, 1);
        let rectangle = Rectangle::new(-1.0, -1.0, 0.0, 0.0);

        let skeletons = layer.create_tile_imagery_skeletons(key, &rectangle);
        let id = skeletons[0].imagery.unwrap();
        assert_eq!(layer.poll_imagery(id), ImageryState::Unloaded);

        layer.request_imagery(id, &mut scheduler);
        assert_eq!(layer.poll_imagery(id), ImageryState::Transitioning);

        // Queued, started, answered.
        scheduler.update();
        scheduler.update();
        assert_eq!(layer.poll_imagery(id), ImageryState::Received);

        layer.create_texture(&mut context, id);
        assert_eq!(layer.poll_imagery(id), ImageryState::Ready);
        assert_eq!(context.live_textures(), 1);

        layer.release_imagery(&mut context, id);
        assert_eq!(context.live_textures(), 0);
        assert_eq!(layer.live_imagery(), 0);
        assert_eq!(layer.poll_imagery(id), ImageryState::Invalid);
    }
}
