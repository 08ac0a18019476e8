//! See [`BoundingBox`].

use serde::{Deserialize, Serialize};

use crate::geo::{GeoPoint, GeoPoint2d};

/// Geographic rectangle covering the visible part of the globe.
///
/// A bounding box is *invalid* when the viewport could not be projected onto the ellipsoid, e.g.
/// when the camera looks past the horizon. Invalid boxes must not be used to filter requests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    south_west: GeoPoint2d,
    north_east: GeoPoint2d,
    valid: bool,
}

impl BoundingBox {
    /// Creates a valid bounding box from its south-west and north-east corners.
    pub fn new(south_west: GeoPoint2d, north_east: GeoPoint2d) -> Self {
        Self {
            south_west,
            north_east,
            valid: true,
        }
    }

    /// Bounding box of a viewport that does not intersect the ellipsoid.
    pub fn invalid() -> Self {
        Self {
            south_west: GeoPoint2d::default(),
            north_east: GeoPoint2d::default(),
            valid: false,
        }
    }

    /// Whether the box was computed from a successful projection.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// South-west corner.
    pub fn south_west(&self) -> GeoPoint2d {
        self.south_west
    }

    /// North-east corner.
    pub fn north_east(&self) -> GeoPoint2d {
        self.north_east
    }

    /// Corner coordinates in `[sw_lon, sw_lat, ne_lon, ne_lat]` order, or `None` for an invalid box.
    pub fn corners(&self) -> Option<[f64; 4]> {
        self.valid.then(|| {
            [
                self.south_west.lon(),
                self.south_west.lat(),
                self.north_east.lon(),
                self.north_east.lat(),
            ]
        })
    }
}
