//! Tile lifecycle states.

use std::fmt;

/// Where a tile is in its load lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TileState {
    /// Created but not prepared, or freed.
    #[default]
    Start,
    /// Terrain or imagery still loading.
    Loading,
    /// Renderable with every attempt finished.
    Ready,
    /// No terrain attempt left and no geometry. Revived to `Loading` when
    /// the parent publishes new data.
    Failed,
}

impl fmt::Display for TileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
