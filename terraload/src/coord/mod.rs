//! Geodetic coordinates, the reference ellipsoid and tiling schemes.
//!
//! Angles are radians throughout. The tile tree only needs a handful of
//! operations from this module: converting tile corners to Earth-fixed
//! positions, surface normals, and mapping tile coordinates to rectangles.
//!
//! # Example
//!
//! ```ignore
//! use terraload::coord::{GeographicTilingScheme, TilingScheme};
//!
//! let scheme = GeographicTilingScheme::new();
//! let rectangle = scheme.tile_xy_to_rectangle(3, 1, 2);
//! let corner = scheme.ellipsoid().cartographic_to_cartesian(rectangle.southwest());
//! ```

mod cartesian;
mod ellipsoid;
mod rectangle;
mod tiling_scheme;

pub use cartesian::{Cartesian3, Cartographic};
pub use ellipsoid::{Ellipsoid, WGS84_SEMI_MAJOR_AXIS, WGS84_SEMI_MINOR_AXIS};
pub use rectangle::Rectangle;
pub use tiling_scheme::{GeographicTilingScheme, TilingScheme};
