//! Resolution of `srsName`/`srsDimension` declarations into a [`CrsContext`].

use serde::{Deserialize, Serialize};
use strata_types::{Crs, GeoPoint3d};

use crate::document::XmlElement;
use crate::error::GmlError;

/// Number of values in a coordinate tuple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    /// `(x, y)` tuples.
    #[default]
    Two,
    /// `(x, y, z)` tuples.
    Three,
}

impl Dimension {
    /// Number of axes.
    pub fn axes(self) -> usize {
        match self {
            Dimension::Two => 2,
            Dimension::Three => 3,
        }
    }

    fn parse(value: &str) -> Result<Self, GmlError> {
        match value.trim().parse::<u32>() {
            Ok(2) => Ok(Dimension::Two),
            Ok(3) => Ok(Dimension::Three),
            _ => Err(GmlError::MalformedCrs(value.to_string())),
        }
    }
}

/// Interpretation of raw coordinates active for a part of the document.
///
/// The context declared on the document's `boundedBy` envelope is inherited by every feature;
/// features and geometry elements may override it with their own `srsName` and `srsDimension`
/// attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrsContext {
    crs: Crs,
    dimension: Dimension,
}

impl CrsContext {
    /// Creates a new context.
    pub fn new(crs: Crs, dimension: Dimension) -> Self {
        Self { crs, dimension }
    }

    /// Coordinate reference system.
    pub fn crs(&self) -> Crs {
        self.crs
    }

    /// Tuple size.
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Derives the context for `node`, which inherits everything it does not declare itself.
    ///
    /// Fails with [`GmlError::UnsupportedCrs`] if the `srsName` attribute is not one of the known
    /// names, and with [`GmlError::MalformedCrs`] if `srsDimension` is not `2` or `3`.
    pub fn resolve(&self, node: &XmlElement) -> Result<CrsContext, GmlError> {
        let mut context = *self;

        if let Some(name) = node.attribute("srsName") {
            context.crs =
                Crs::from_name(name).ok_or_else(|| GmlError::UnsupportedCrs(name.to_string()))?;
            log::trace!("{name} resolved to EPSG:{}", context.crs.epsg());
        }

        if let Some(dimension) = node.attribute("srsDimension") {
            context.dimension = Dimension::parse(dimension)?;
        }

        Ok(context)
    }

    /// Converts a coordinate tuple into a point. The tuple must have exactly
    /// [`dimension().axes()`](Dimension::axes) values.
    pub fn point(&self, axes: &[f64]) -> Option<GeoPoint3d> {
        if axes.len() != self.dimension.axes() {
            return None;
        }

        self.crs.point(axes)
    }
}

/// Resolves `node` against a parent context that may itself have failed to resolve.
///
/// A failed parent is only recoverable if `node` names its own CRS.
pub(crate) fn resolve_over(
    parent: &Result<CrsContext, GmlError>,
    node: &XmlElement,
) -> Result<CrsContext, GmlError> {
    match parent {
        Ok(context) => context.resolve(node),
        Err(_) if node.attribute("srsName").is_some() => CrsContext::default().resolve(node),
        Err(error) => Err(error.clone()),
    }
}
