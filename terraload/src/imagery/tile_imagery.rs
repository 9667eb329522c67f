//! Per-tile imagery attachments.

use crate::render::TextureHandle;
use crate::tile::TileKey;
use std::fmt;

/// Identifier of one piece of imagery inside its layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageryId(pub u64);

impl fmt::Display for ImageryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "imagery#{}", self.0)
    }
}

/// A skeleton: the link between a tile and one piece of layer imagery.
///
/// `texture_translation_and_scale` is `[x, y, scale_x, scale_y]` mapping
/// the tile's texture coordinates into the imagery's, filled in once the
/// imagery is ready. A skeleton whose imagery was released keeps only the
/// translation to describe the region it covered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileImagery {
    pub imagery: Option<ImageryId>,
    pub texture_translation_and_scale: Option<[f64; 4]>,
}

impl TileImagery {
    pub fn new(imagery: ImageryId) -> Self {
        Self {
            imagery: Some(imagery),
            texture_translation_and_scale: None,
        }
    }

    pub fn with_translation_and_scale(mut self, translation_and_scale: [f64; 4]) -> Self {
        self.texture_translation_and_scale = Some(translation_and_scale);
        self
    }
}

/// An ancestor's composed texture used in place of the tile's own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InheritedTexture {
    pub texture: TextureHandle,
    pub source: TileKey,
    pub translation_and_scale: [f64; 4],
}

/// Everything a tile holds for one imagery layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerImagery {
    /// Attachments still being driven to a terminal state.
    pub skeletons: Vec<TileImagery>,
    /// The tile's own composed texture.
    pub texture: Option<TextureHandle>,
    /// Ancestor texture shown until (or instead of) the tile's own.
    pub inherited: Option<InheritedTexture>,
    /// Released failed attachments: regions that come from `inherited`.
    pub missing: Vec<TileImagery>,
}

impl LayerImagery {
    pub fn new(skeletons: Vec<TileImagery>) -> Self {
        Self {
            skeletons,
            ..Default::default()
        }
    }

    /// Returns true once no skeleton is pending.
    pub fn is_done(&self) -> bool {
        self.skeletons.is_empty()
    }

    /// Returns true if the layer can be drawn now.
    pub fn is_renderable(&self) -> bool {
        self.is_done() || self.texture.is_some() || self.inherited.is_some()
    }

    /// True when the layer is drawn only from an ancestor's texture.
    pub fn is_inherited_only(&self) -> bool {
        self.texture.is_none() && self.inherited.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_layer_without_texture_is_not_renderable() {
        let layer = LayerImagery::new(vec![TileImagery::new(ImageryId(1))]);
        assert!(!layer.is_done());
        assert!(!layer.is_renderable());
    }

    #[test]
    fn test_pending_layer_with_inherited_texture_is_renderable() {
        let mut layer = LayerImagery::new(vec![TileImagery::new(ImageryId(1))]);
        layer.inherited = Some(InheritedTexture {
            texture: TextureHandle(9),
            source: TileKey::new(0, 0, 0),
            translation_and_scale: [0.0, 0.0, 0.5, 0.5],
        });
        assert!(layer.is_renderable());
        assert!(layer.is_inherited_only());
    }

    #[test]
    fn test_empty_layer_is_done_and_renderable() {
        let layer = LayerImagery::default();
        assert!(layer.is_done());
        assert!(layer.is_renderable());
        assert!(!layer.is_inherited_only());
    }
}
