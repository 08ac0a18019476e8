//! Geometries in geographic coordinates (see [`GeoPoint`]) and the coordinate reference systems
//! used to interpret raw coordinate tuples (see [`Crs`]).

mod crs;
mod point;

pub use crs::Crs;
pub use point::{GeoPoint, GeoPoint2d, GeoPoint3d, NewGeoPoint};
