use approx::{AbsDiffEq, RelativeEq};
use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Point on the surface of the Earth given by longitude and latitude in degrees.
pub trait GeoPoint {
    /// Numeric type used to represent coordinates.
    type Num: Float;

    /// Latitude in degrees.
    fn lat(&self) -> Self::Num;
    /// Longitude in degrees.
    fn lon(&self) -> Self::Num;

    /// Latitude in radians.
    fn lat_rad(&self) -> Self::Num {
        self.lat().to_radians()
    }

    /// Longitude in radians.
    fn lon_rad(&self) -> Self::Num {
        self.lon().to_radians()
    }
}

/// Geographic point that can be constructed from coordinates.
pub trait NewGeoPoint<N = f64>: GeoPoint<Num = N> + Sized {
    /// Creates a point from latitude and longitude.
    fn latlon(lat: N, lon: N) -> Self;

    /// Creates a point from longitude and latitude.
    fn lonlat(lon: N, lat: N) -> Self {
        Self::latlon(lat, lon)
    }
}

/// 2d geographic point. Used for the corners of the visible region.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct GeoPoint2d {
    lon: f64,
    lat: f64,
}

impl GeoPoint for GeoPoint2d {
    type Num = f64;

    fn lat(&self) -> f64 {
        self.lat
    }

    fn lon(&self) -> f64 {
        self.lon
    }
}

impl NewGeoPoint<f64> for GeoPoint2d {
    fn latlon(lat: f64, lon: f64) -> Self {
        Self { lon, lat }
    }
}

/// Geographic point with a height above the ellipsoid (in meters).
///
/// This is the coordinate type of every geometry record decoded from a feature collection.
/// Coordinates are always stored longitude first, whatever axis order the source document used.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct GeoPoint3d {
    lon: f64,
    lat: f64,
    height: f64,
}

impl GeoPoint3d {
    /// Creates a new point.
    pub fn new(lon: f64, lat: f64, height: f64) -> Self {
        Self { lon, lat, height }
    }

    /// Height in meters.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Returns the same point with zero height.
    pub fn on_surface(&self) -> Self {
        Self {
            height: 0.0,
            ..*self
        }
    }
}

impl GeoPoint for GeoPoint3d {
    type Num = f64;

    fn lat(&self) -> f64 {
        self.lat
    }

    fn lon(&self) -> f64 {
        self.lon
    }
}

impl NewGeoPoint<f64> for GeoPoint3d {
    fn latlon(lat: f64, lon: f64) -> Self {
        Self::new(lon, lat, 0.0)
    }
}

impl AbsDiffEq for GeoPoint3d {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.lon.abs_diff_eq(&other.lon, epsilon)
            && self.lat.abs_diff_eq(&other.lat, epsilon)
            && self.height.abs_diff_eq(&other.height, epsilon)
    }
}

impl RelativeEq for GeoPoint3d {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.lon.relative_eq(&other.lon, epsilon, max_relative)
            && self.lat.relative_eq(&other.lat, epsilon, max_relative)
            && self.height.relative_eq(&other.height, epsilon, max_relative)
    }
}

/// Creates a new [`GeoPoint3d`] on the ellipsoid surface from longitude and latitude values
/// (in degrees).
///
/// ```
/// use strata_types::geo::GeoPoint;
/// use strata_types::lonlat;
///
/// let point = lonlat!(52.0, 38.0);
/// assert_eq!(point.lat(), 38.0);
/// ```
#[macro_export]
macro_rules! lonlat {
    ($lon:expr, $lat:expr) => {
        <$crate::geo::GeoPoint3d as $crate::geo::NewGeoPoint<f64>>::lonlat($lon, $lat)
    };
}
