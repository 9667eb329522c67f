//! Imagery states.

use std::fmt;

/// Load progress of one piece of imagery, as reported by its layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageryState {
    /// Nothing requested yet.
    #[default]
    Unloaded,
    /// A request or texture upload is in flight.
    Transitioning,
    /// Image bytes are available.
    Received,
    /// Texture created, not yet finalized by the layer.
    TextureLoaded,
    /// Usable.
    Ready,
    /// The request or decode failed.
    Failed,
    /// The provider has no imagery here.
    Invalid,
    /// Stand-in used while the layer's provider is not ready.
    Placeholder,
}

impl ImageryState {
    /// Returns true once the imagery can no longer change.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Failed | Self::Invalid)
    }

    /// Returns true if the imagery will never produce a texture.
    pub fn is_unusable(self) -> bool {
        matches!(self, Self::Failed | Self::Invalid)
    }
}

impl fmt::Display for ImageryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unloaded => "unloaded",
            Self::Transitioning => "transitioning",
            Self::Received => "received",
            Self::TextureLoaded => "texture-loaded",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Invalid => "invalid",
            Self::Placeholder => "placeholder",
        };
        f.write_str(name)
    }
}
