//! Value types shared by the Strata crates: geographic points, the coordinate reference systems
//! a WFS layer understands, bounding boxes of the visible region and the geometry records produced
//! from GML feature collections.

pub mod bounding_box;
pub mod geo;
pub mod geometry;

pub use bounding_box::BoundingBox;
pub use geo::{Crs, GeoPoint, GeoPoint2d, GeoPoint3d, NewGeoPoint};
pub use geometry::{GeometryRecord, LineString, MultiLineString};
