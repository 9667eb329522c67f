//! Terrain attempt states.

use std::fmt;

/// Progress of one terrain attempt.
///
/// Variants are declared in pipeline order so `state >= TerrainState::Received`
/// reads as "data is available". `Failed` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum TerrainState {
    /// Gave up. Terminal.
    Failed,
    /// Nothing requested yet, or a request was cancelled and must be retried.
    #[default]
    Unloaded,
    /// Waiting for the network response or the upsampler.
    Receiving,
    /// Terrain data decoded, no mesh yet.
    Received,
    /// Waiting for the mesh builder.
    Transforming,
    /// Mesh built, GPU resources not created yet.
    Transformed,
    /// Vertex array created. Terminal.
    Ready,
}

impl TerrainState {
    /// Returns true while asynchronous work is outstanding.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Receiving | Self::Transforming)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Ready)
    }
}

impl fmt::Display for TerrainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Failed => "failed",
            Self::Unloaded => "unloaded",
            Self::Receiving => "receiving",
            Self::Received => "received",
            Self::Transforming => "transforming",
            Self::Transformed => "transformed",
            Self::Ready => "ready",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_ordering() {
        assert!(TerrainState::Failed < TerrainState::Unloaded);
        assert!(TerrainState::Receiving < TerrainState::Received);
        assert!(TerrainState::Transforming >= TerrainState::Received);
        assert!(TerrainState::Ready > TerrainState::Transformed);
    }

    #[test]
    fn test_busy_states() {
        assert!(TerrainState::Receiving.is_busy());
        assert!(TerrainState::Transforming.is_busy());
        assert!(!TerrainState::Received.is_busy());
        assert!(!TerrainState::Unloaded.is_busy());
    }
}
