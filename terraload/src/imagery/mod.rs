//! Imagery layers and the attachments tiles keep for them.
//!
//! Fetching, decoding and texture composition belong to the
//! [`ImageryLayer`] implementation. The tile state machine drives each
//! [`TileImagery`] skeleton through the layer until it is ready, failed or
//! invalid, then composes the layer into one texture per tile or falls back
//! to an ancestor's texture.

mod layer;
mod state;
mod tile_imagery;

pub use layer::{ImageryLayer, ImageryLayerCollection};
pub use state::ImageryState;
pub use tile_imagery::{ImageryId, InheritedTexture, LayerImagery, TileImagery};
