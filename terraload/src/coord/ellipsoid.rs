//! Reference ellipsoid.

use super::cartesian::{Cartesian3, Cartographic};

/// WGS84 semi-major axis in meters.
pub const WGS84_SEMI_MAJOR_AXIS: f64 = 6_378_137.0;

/// WGS84 semi-minor axis in meters.
pub const WGS84_SEMI_MINOR_AXIS: f64 = 6_356_752.314_245_179;

/// An axis-aligned ellipsoid centered at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    radii: Cartesian3,
    radii_squared: Cartesian3,
    one_over_radii_squared: Cartesian3,
}

impl Ellipsoid {
    /// The WGS84 ellipsoid.
    pub const WGS84: Self = Self::from_radii(
        WGS84_SEMI_MAJOR_AXIS,
        WGS84_SEMI_MAJOR_AXIS,
        WGS84_SEMI_MINOR_AXIS,
    );

    /// Creates an ellipsoid from its radii along each axis.
    pub const fn from_radii(x: f64, y: f64, z: f64) -> Self {
        Self {
            radii: Cartesian3::new(x, y, z),
            radii_squared: Cartesian3::new(x * x, y * y, z * z),
            one_over_radii_squared: Cartesian3::new(
                1.0 / (x * x),
                1.0 / (y * y),
                1.0 / (z * z),
            ),
        }
    }

    pub fn radii(&self) -> Cartesian3 {
        self.radii
    }

    /// Maximum radius.
    pub fn maximum_radius(&self) -> f64 {
        self.radii.x.max(self.radii.y).max(self.radii.z)
    }

    /// Unit normal to the surface at a geodetic position.
    pub fn geodetic_surface_normal_cartographic(&self, cartographic: Cartographic) -> Cartesian3 {
        let cos_latitude = cartographic.latitude.cos();
        Cartesian3::new(
            cos_latitude * cartographic.longitude.cos(),
            cos_latitude * cartographic.longitude.sin(),
            cartographic.latitude.sin(),
        )
        .normalize()
    }

    /// Unit normal to the surface at (or above) a Cartesian position.
    pub fn geodetic_surface_normal(&self, cartesian: Cartesian3) -> Cartesian3 {
        cartesian
            .multiply_components(self.one_over_radii_squared)
            .normalize()
    }

    /// Converts a geodetic position to Earth-fixed Cartesian coordinates.
    pub fn cartographic_to_cartesian(&self, cartographic: Cartographic) -> Cartesian3 {
        let n = self.geodetic_surface_normal_cartographic(cartographic);
        let k = self.radii_squared.multiply_components(n);
        let gamma = n.dot(k).sqrt();
        k / gamma + n * cartographic.height
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}
