//! Reference-counted water mask textures.
//!
//! Most terrain tiles are either all land or all water. Those share two
//! textures created once for the whole tree. Every other mask gets its own
//! texture, destroyed when the last tile holding it lets go.
//!
//! The cache holds one reference of its own to each shared texture, so they
//! survive every tile release and are only destroyed by
//! [`WaterMaskCache::destroy`].

use crate::render::{RenderContext, TextureHandle};
use crate::terrain::WaterMask;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Pixel value of land in a water mask.
pub const LAND: u8 = 0;

/// Pixel value of water in a water mask.
pub const WATER: u8 = 255;

/// A tile's reference to a water mask texture.
///
/// Not `Clone`: take another reference with [`WaterMaskCache::share`] and
/// give each one back with [`WaterMaskCache::release`].
#[derive(Debug, PartialEq, Eq)]
pub struct WaterMaskHandle {
    texture: TextureHandle,
}

impl WaterMaskHandle {
    pub fn texture(&self) -> TextureHandle {
        self.texture
    }
}

#[derive(Debug, Clone, Copy)]
struct SharedTextures {
    land: TextureHandle,
    water: TextureHandle,
}

/// Arena of water mask textures keyed by texture handle.
#[derive(Debug, Default)]
pub struct WaterMaskCache {
    shared: Option<SharedTextures>,
    reference_counts: HashMap<TextureHandle, usize>,
}

impl WaterMaskCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a reference to the texture for `mask`, creating it if needed.
    pub fn acquire(
        &mut self,
        context: &mut dyn RenderContext,
        mask: &WaterMask,
    ) -> WaterMaskHandle {
        let texture = match mask.uniform_value() {
            Some(LAND) => self.shared_textures(context).land,
            Some(WATER) => self.shared_textures(context).water,
            _ => {
                let texture = context.create_texture(mask.width, mask.height, &mask.pixels);
                self.reference_counts.insert(texture, 0);
                debug!(%texture, width = mask.width, height = mask.height, "Created water mask texture");
                texture
            }
        };
        self.add_reference(texture)
    }

    /// Takes another reference to the texture behind `handle`.
    pub fn share(&mut self, handle: &WaterMaskHandle) -> WaterMaskHandle {
        self.add_reference(handle.texture)
    }

    /// Gives back a reference, destroying the texture when it was the last.
    pub fn release(&mut self, context: &mut dyn RenderContext, handle: WaterMaskHandle) {
        self.remove_reference(context, handle.texture);
    }

    /// References held on `texture`, including the cache's own for shared textures.
    pub fn reference_count(&self, texture: TextureHandle) -> usize {
        self.reference_counts.get(&texture).copied().unwrap_or_default()
    }

    /// The shared all-land texture, once created.
    pub fn land_texture(&self) -> Option<TextureHandle> {
        self.shared.map(|shared| shared.land)
    }

    /// The shared all-water texture, once created.
    pub fn water_texture(&self) -> Option<TextureHandle> {
        self.shared.map(|shared| shared.water)
    }

    /// Number of live textures, shared ones included.
    pub fn len(&self) -> usize {
        self.reference_counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reference_counts.is_empty()
    }

    /// Drops the cache's own references to the shared textures.
    ///
    /// Call after every tile has released its masks; textures still
    /// referenced by tiles are logged and left alive.
    pub fn destroy(&mut self, context: &mut dyn RenderContext) {
        if let Some(shared) = self.shared.take() {
            self.remove_reference(context, shared.land);
            self.remove_reference(context, shared.water);
        }
        if !self.reference_counts.is_empty() {
            warn!(
                count = self.reference_counts.len(),
                "Water mask textures still referenced after destroy"
            );
        }
    }

    fn shared_textures(&mut self, context: &mut dyn RenderContext) -> SharedTextures {
        if let Some(shared) = self.shared {
            return shared;
        }
        let shared = SharedTextures {
            land: context.create_texture(1, 1, &[LAND]),
            water: context.create_texture(1, 1, &[WATER]),
        };
        self.reference_counts.insert(shared.land, 1);
        self.reference_counts.insert(shared.water, 1);
        self.shared = Some(shared);
        debug!(land = %shared.land, water = %shared.water, "Created shared water mask textures");
        shared
    }

    fn add_reference(&mut self, texture: TextureHandle) -> WaterMaskHandle {
        *self.reference_counts.entry(texture).or_default() += 1;
        WaterMaskHandle { texture }
    }

    fn remove_reference(&mut self, context: &mut dyn RenderContext, texture: TextureHandle) {
        let Some(count) = self.reference_counts.get_mut(&texture) else {
            warn!(%texture, "Released an unknown water mask texture");
            return;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.reference_counts.remove(&texture);
            context.destroy_texture(texture);
            debug!(%texture, "Destroyed water mask texture");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::CountingRenderContext;

    #[test]
    fn test_uniform_masks_share_textures() {
        let mut context = CountingRenderContext::new();
        let mut cache = WaterMaskCache::new();

        let a = cache.acquire(&mut context, &WaterMask::uniform(LAND));
        let b = cache.acquire(&mut context, &WaterMask::uniform(LAND));
        let c = cache.acquire(&mut context, &WaterMask::uniform(WATER));

        assert_eq!(a.texture(), b.texture());
        assert_ne!(a.texture(), c.texture());
        // Both shared textures are created together, nothing else.
        assert_eq!(context.textures_created(), 2);
        assert_eq!(cache.reference_count(a.texture()), 3);
        assert_eq!(cache.reference_count(c.texture()), 2);
    }

    #[test]
    fn test_shared_textures_survive_release() {
        let mut context = CountingRenderContext::new();
        let mut cache = WaterMaskCache::new();

        let handle = cache.acquire(&mut context, &WaterMask::uniform(WATER));
        let texture = handle.texture();
        cache.release(&mut context, handle);

        assert!(context.is_texture_alive(texture));
        assert_eq!(cache.reference_count(texture), 1);
    }

    #[test]
    fn test_unique_mask_destroyed_with_last_reference() {
        let mut context = CountingRenderContext::new();
        let mut cache = WaterMaskCache::new();
        let mask = WaterMask::new(2, 2, vec![LAND, WATER, WATER, LAND]);

        let first = cache.acquire(&mut context, &mask);
        let second = cache.share(&first);
        let texture = first.texture();
        assert_eq!(cache.reference_count(texture), 2);

        cache.release(&mut context, first);
        assert!(context.is_texture_alive(texture));

        cache.release(&mut context, second);
        assert!(!context.is_texture_alive(texture));
        assert_eq!(cache.reference_count(texture), 0);
    }

    #[test]
    fn test_identical_unique_masks_get_separate_textures() {
        let mut context = CountingRenderContext::new();
        let mut cache = WaterMaskCache::new();
        let mask = WaterMask::new(2, 2, vec![LAND, WATER, WATER, LAND]);

        let a = cache.acquire(&mut context, &mask);
        let b = cache.acquire(&mut context, &mask);
        assert_ne!(a.texture(), b.texture());
        assert_eq!(cache.reference_count(a.texture()), 1);
    }

    #[test]
    fn test_destroy_releases_shared_textures() {
        let mut context = CountingRenderContext::new();
        let mut cache = WaterMaskCache::new();
        let handle = cache.acquire(&mut context, &WaterMask::uniform(LAND));
        cache.release(&mut context, handle);

        cache.destroy(&mut context);
        assert_eq!(context.live_textures(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.land_texture(), None);
    }
}
