//! Terrain pipeline errors.

use crate::request::FetchError;
use thiserror::Error;

/// Result type for terrain collaborators.
pub type TerrainResult<T> = Result<T, TerrainError>;

/// Why a terrain attempt failed.
///
/// These never escape the tile state machine. They are logged and the
/// attempt moves to [`TerrainState::Failed`](super::TerrainState::Failed).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TerrainError {
    #[error("Terrain request failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to decode terrain data: {0}")]
    Decode(String),

    #[error("Failed to build terrain mesh: {0}")]
    Mesh(String),

    #[error("Failed to upsample terrain data: {0}")]
    Upsample(String),
}
