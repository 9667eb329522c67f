//! Geodetic rectangles.

use super::cartesian::Cartographic;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// A region bounded by two meridians and two parallels, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rectangle {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Rectangle {
    /// The whole globe.
    pub const MAX_VALUE: Self = Self::new(-PI, -FRAC_PI_2, PI, FRAC_PI_2);

    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Creates a rectangle from bounds in degrees.
    pub fn from_degrees(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self::new(
            west.to_radians(),
            south.to_radians(),
            east.to_radians(),
            north.to_radians(),
        )
    }

    /// Longitudinal extent, accounting for rectangles crossing the antimeridian.
    pub fn width(&self) -> f64 {
        if self.east < self.west {
            self.east + TAU - self.west
        } else {
            self.east - self.west
        }
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    pub fn southwest(&self) -> Cartographic {
        Cartographic::new(self.west, self.south, 0.0)
    }

    pub fn southeast(&self) -> Cartographic {
        Cartographic::new(self.east, self.south, 0.0)
    }

    pub fn northeast(&self) -> Cartographic {
        Cartographic::new(self.east, self.north, 0.0)
    }

    pub fn northwest(&self) -> Cartographic {
        Cartographic::new(self.west, self.north, 0.0)
    }

    pub fn center(&self) -> Cartographic {
        let mut longitude = self.west + self.width() * 0.5;
        if longitude > PI {
            longitude -= TAU;
        }
        Cartographic::new(longitude, (self.south + self.north) * 0.5, 0.0)
    }

    /// Returns true if the position lies inside or on the border.
    pub fn contains(&self, position: Cartographic) -> bool {
        let mut longitude = position.longitude;
        let mut east = self.east;
        if east < self.west {
            east += TAU;
            if longitude < 0.0 {
                longitude += TAU;
            }
        }
        longitude >= self.west
            && longitude <= east
            && position.latitude >= self.south
            && position.latitude <= self.north
    }

    /// Translation and scale mapping texture coordinates of `self` into
    /// texture coordinates of `outer`, as `[x, y, scale_x, scale_y]`.
    pub fn translation_and_scale_within(&self, outer: &Rectangle) -> [f64; 4] {
        let width = self.width();
        let height = self.height();
        let scale_x = width / outer.width();
        let scale_y = height / outer.height();
        [
            scale_x * (self.west - outer.west) / width,
            scale_y * (self.south - outer.south) / height,
            scale_x,
            scale_y,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_and_height() {
        let r = Rectangle::from_degrees(-10.0, -5.0, 10.0, 5.0);
        assert!((r.width() - 20f64.to_radians()).abs() < 1e-12);
        assert!((r.height() - 10f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_width_across_antimeridian() {
        let r = Rectangle::from_degrees(170.0, 0.0, -170.0, 10.0);
        assert!((r.width() - 20f64.to_radians()).abs() < 1e-12);
        assert!(r.contains(Cartographic::from_degrees(180.0, 5.0)));
        assert!(r.contains(Cartographic::from_degrees(-175.0, 5.0)));
        assert!(!r.contains(Cartographic::from_degrees(0.0, 5.0)));
    }

    #[test]
    fn test_corners() {
        let r = Rectangle::new(-1.0, -0.5, 1.0, 0.5);
        assert_eq!(r.southwest(), Cartographic::new(-1.0, -0.5, 0.0));
        assert_eq!(r.northeast(), Cartographic::new(1.0, 0.5, 0.0));
        assert_eq!(r.center(), Cartographic::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_translation_and_scale_of_southwest_quadrant() {
        let outer = Rectangle::new(-PI, -FRAC_PI_2, 0.0, FRAC_PI_2);
        let inner = Rectangle::new(-PI, -FRAC_PI_2, -FRAC_PI_2, 0.0);
        let [x, y, sx, sy] = inner.translation_and_scale_within(&outer);
        assert!(x.abs() < 1e-12);
        assert!(y.abs() < 1e-12);
        assert!((sx - 0.5).abs() < 1e-12);
        assert!((sy - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_translation_and_scale_of_northeast_quadrant() {
        let outer = Rectangle::new(0.0, 0.0, 2.0, 2.0);
        let inner = Rectangle::new(1.0, 1.0, 2.0, 2.0);
        assert_eq!(inner.translation_and_scale_within(&outer), [0.5, 0.5, 0.5, 0.5]);
    }
}
