use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint3d;

/// Geographic coordinate reference system of the EPSG:4326 family.
///
/// Raw coordinate tuples are interpreted as `(longitude, latitude[, height])` in degrees: the first
/// axis of a tuple always becomes the longitude of the resulting point. Feeds that declare one of
/// the names in [`Crs::WGS84_NAMES`] are read with this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs {
    epsg: u32,
}

impl Crs {
    /// WGS 84 geographic coordinates.
    pub const WGS84: Crs = Crs { epsg: 4326 };

    /// Names under which servers publish [`Crs::WGS84`].
    pub const WGS84_NAMES: [&'static str; 4] = [
        "EPSG:4326",
        "urn:ogc:def:crs:EPSG::4326",
        "urn:ogc:def:crs:EPSG:6.6:4326",
        "http://www.opengis.net/gml/srs/epsg.xml#4326",
    ];

    /// Looks up a CRS by the name used in an `srsName` attribute.
    pub fn from_name(name: &str) -> Option<Crs> {
        if Self::WGS84_NAMES.contains(&name) {
            Some(Self::WGS84)
        } else {
            None
        }
    }

    /// EPSG code of the system.
    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    /// Converts a raw tuple of 2 or 3 axis values into a point.
    ///
    /// Returns `None` if the tuple has fewer than 2 or more than 3 values.
    pub fn point(&self, axes: &[f64]) -> Option<GeoPoint3d> {
        match *axes {
            [lon, lat] => Some(GeoPoint3d::new(lon, lat, 0.0)),
            [lon, lat, height] => Some(GeoPoint3d::new(lon, lat, height)),
            _ => None,
        }
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::WGS84
    }
}
