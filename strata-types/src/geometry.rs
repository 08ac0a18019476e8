//! Geometry records decoded from feature collections.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint3d;

/// Ordered sequence of points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineString {
    points: Vec<GeoPoint3d>,
}

impl LineString {
    /// Creates a new line string.
    pub fn new(points: Vec<GeoPoint3d>) -> Self {
        Self { points }
    }

    /// Points of the line in order.
    pub fn points(&self) -> &[GeoPoint3d] {
        &self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the line has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl From<Vec<GeoPoint3d>> for LineString {
    fn from(points: Vec<GeoPoint3d>) -> Self {
        Self::new(points)
    }
}

/// Set of independent line strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiLineString {
    parts: Vec<LineString>,
}

impl MultiLineString {
    /// Creates a new multi line string. Part order is preserved.
    pub fn new(parts: Vec<LineString>) -> Self {
        Self { parts }
    }

    /// Member lines in order.
    pub fn parts(&self) -> &[LineString] {
        &self.parts
    }
}

/// A single decoded geometry of a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeometryRecord {
    /// Single position.
    Point(GeoPoint3d),
    /// Polyline.
    LineString(LineString),
    /// Several polylines belonging to one geometry element.
    MultiLineString(MultiLineString),
}

impl GeometryRecord {
    /// Total number of points in the geometry.
    pub fn point_count(&self) -> usize {
        match self {
            GeometryRecord::Point(_) => 1,
            GeometryRecord::LineString(line) => line.len(),
            GeometryRecord::MultiLineString(lines) => lines.parts().iter().map(|l| l.len()).sum(),
        }
    }
}
