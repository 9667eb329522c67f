//! Tiling schemes.
//!
//! A tiling scheme partitions the globe into a quadtree of rectangular tiles.
//! Level zero holds `number_of_x_tiles_at_level(0) * number_of_y_tiles_at_level(0)`
//! roots and every level doubles the tile count along each axis. Tile `y`
//! grows southward: `y == 0` is the northernmost row.

use super::cartesian::Cartographic;
use super::ellipsoid::Ellipsoid;
use super::rectangle::Rectangle;
use std::fmt::Debug;

/// Maps tile coordinates to geodetic rectangles.
pub trait TilingScheme: Send + Sync + Debug {
    /// Ellipsoid the tiles are draped over.
    fn ellipsoid(&self) -> &Ellipsoid;

    /// Extent covered by the whole scheme.
    fn rectangle(&self) -> &Rectangle;

    fn number_of_x_tiles_at_level(&self, level: u32) -> u32;

    fn number_of_y_tiles_at_level(&self, level: u32) -> u32;

    /// Geodetic rectangle of the tile at `(x, y, level)`.
    fn tile_xy_to_rectangle(&self, x: u32, y: u32, level: u32) -> Rectangle;

    /// Tile containing `position` at `level`, or `None` when outside the scheme.
    fn position_to_tile_xy(&self, position: Cartographic, level: u32) -> Option<(u32, u32)>;
}

/// Equirectangular tiling with two root tiles (western and eastern hemisphere).
#[derive(Debug, Clone, PartialEq)]
pub struct GeographicTilingScheme {
    ellipsoid: Ellipsoid,
    rectangle: Rectangle,
    number_of_level_zero_tiles_x: u32,
    number_of_level_zero_tiles_y: u32,
}

impl GeographicTilingScheme {
    pub fn new() -> Self {
        Self {
            ellipsoid: Ellipsoid::WGS84,
            rectangle: Rectangle::MAX_VALUE,
            number_of_level_zero_tiles_x: 2,
            number_of_level_zero_tiles_y: 1,
        }
    }

    pub fn with_ellipsoid(mut self, ellipsoid: Ellipsoid) -> Self {
        self.ellipsoid = ellipsoid;
        self
    }

    pub fn with_rectangle(mut self, rectangle: Rectangle) -> Self {
        self.rectangle = rectangle;
        self
    }

    /// Sets the root grid. Zero counts are clamped to one.
    pub fn with_level_zero_tiles(mut self, x: u32, y: u32) -> Self {
        self.number_of_level_zero_tiles_x = x.max(1);
        self.number_of_level_zero_tiles_y = y.max(1);
        self
    }
}

impl Default for GeographicTilingScheme {
    fn default() -> Self {
        Self::new()
    }
}

impl TilingScheme for GeographicTilingScheme {
    fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    fn rectangle(&self) -> &Rectangle {
        &self.rectangle
    }

    fn number_of_x_tiles_at_level(&self, level: u32) -> u32 {
        self.number_of_level_zero_tiles_x << level
    }

    fn number_of_y_tiles_at_level(&self, level: u32) -> u32 {
        self.number_of_level_zero_tiles_y << level
    }

    fn tile_xy_to_rectangle(&self, x: u32, y: u32, level: u32) -> Rectangle {
        let tile_width = self.rectangle.width() / f64::from(self.number_of_x_tiles_at_level(level));
        let tile_height =
            self.rectangle.height() / f64::from(self.number_of_y_tiles_at_level(level));

        let west = f64::from(x) * tile_width + self.rectangle.west;
        let east = f64::from(x + 1) * tile_width + self.rectangle.west;
        let north = self.rectangle.north - f64::from(y) * tile_height;
        let south = self.rectangle.north - f64::from(y + 1) * tile_height;

        Rectangle::new(west, south, east, north)
    }

    fn position_to_tile_xy(&self, position: Cartographic, level: u32) -> Option<(u32, u32)> {
        if !self.rectangle.contains(position) {
            return None;
        }

        let x_tiles = self.number_of_x_tiles_at_level(level);
        let y_tiles = self.number_of_y_tiles_at_level(level);
        let tile_width = self.rectangle.width() / f64::from(x_tiles);
        let tile_height = self.rectangle.height() / f64::from(y_tiles);

        let mut longitude = position.longitude;
        if self.rectangle.east < self.rectangle.west {
            longitude += std::f64::consts::TAU;
        }

        let x = (((longitude - self.rectangle.west) / tile_width) as u32).min(x_tiles - 1);
        let y = (((self.rectangle.north - position.latitude) / tile_height) as u32).min(y_tiles - 1);
        Some((x, y))
    }
}
