//! Static culling geometry of a tile.

use crate::coord::{Cartesian3, Ellipsoid, Rectangle};

/// Corner points and outward edge-plane normals of a tile on the ellipsoid.
///
/// The west and east normals belong to the meridian planes through the
/// origin. The south and north normals belong to planes through the edge
/// that contain the surface normal at its eastern end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    pub southwest_corner: Cartesian3,
    pub northeast_corner: Cartesian3,
    pub west_normal: Cartesian3,
    pub south_normal: Cartesian3,
    pub east_normal: Cartesian3,
    pub north_normal: Cartesian3,
}

impl TileBounds {
    pub fn compute(rectangle: &Rectangle, ellipsoid: &Ellipsoid) -> Self {
        let southwest_corner = ellipsoid.cartographic_to_cartesian(rectangle.southwest());
        let northeast_corner = ellipsoid.cartographic_to_cartesian(rectangle.northeast());
        let southeast_corner = ellipsoid.cartographic_to_cartesian(rectangle.southeast());
        let northwest_corner = ellipsoid.cartographic_to_cartesian(rectangle.northwest());

        let west_normal = Cartesian3::UNIT_Z.cross(-southwest_corner).normalize();
        let east_normal = (-northeast_corner).cross(Cartesian3::UNIT_Z).normalize();

        let south_normal = ellipsoid
            .geodetic_surface_normal(southeast_corner)
            .cross(southwest_corner - southeast_corner)
            .normalize();
        let north_normal = ellipsoid
            .geodetic_surface_normal(northwest_corner)
            .cross(northeast_corner - northwest_corner)
            .normalize();

        Self {
            southwest_corner,
            northeast_corner,
            west_normal,
            south_normal,
            east_normal,
            north_normal,
        }
    }

    /// The four normals in west, south, east, north order.
    pub fn normals(&self) -> [Cartesian3; 4] {
        [
            self.west_normal,
            self.south_normal,
            self.east_normal,
            self.north_normal,
        ]
    }
}
