//! Error type used by the crate.

use thiserror::Error;

/// Errors produced while reading a GML feature collection.
///
/// Only [`GmlError::Xml`] and [`GmlError::ServiceException`] concern the document as a whole. All
/// other variants are raised for a single feature or geometry and are skipped by
/// [`FeatureParser`](crate::FeatureParser) when it is configured to skip recoverable errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GmlError {
    /// The document is not well-formed XML.
    #[error("xml error: {0}")]
    Xml(String),

    /// The server answered with an exception report instead of a feature collection.
    #[error("service exception: {0}")]
    ServiceException(String),

    /// `srsName` names a coordinate reference system that is not supported.
    #[error("unsupported crs: {0}")]
    UnsupportedCrs(String),

    /// `srsDimension` is not a supported number of axes.
    #[error("malformed srsDimension value: {0:?}")]
    MalformedCrs(String),

    /// A coordinate tuple has a different number of axes than the declared dimension.
    #[error("coordinate tuple {tuple:?} has {found} values, expected {expected}")]
    CoordinateArity {
        /// Dimension of the active CRS context.
        expected: usize,
        /// Number of values in the tuple.
        found: usize,
        /// The offending tuple.
        tuple: String,
    },

    /// A coordinate value is not a finite number.
    #[error("invalid coordinate value {token:?}{}", feature_suffix(.feature))]
    CoordinateParse {
        /// The offending token.
        token: String,
        /// Identifier of the feature the token belongs to, if known.
        feature: Option<String>,
    },

    /// A feature element has no identifier of the form `<typeName>.<integer>`.
    #[error("invalid feature id: {0:?}")]
    InvalidFeatureId(String),

    /// Geometry element with a tag that cannot be decoded.
    #[error("unknown geometry type: {0}")]
    UnknownGeometryType(String),

    /// Geometry element with broken structure.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

fn feature_suffix(feature: &Option<String>) -> String {
    match feature {
        Some(id) => format!(" in feature {id}"),
        None => String::new(),
    }
}

impl GmlError {
    /// Attaches the id of the feature being decoded to errors that report it.
    pub fn in_feature(self, feature_id: &str) -> Self {
        match self {
            GmlError::CoordinateParse {
                token,
                feature: None,
            } => GmlError::CoordinateParse {
                token,
                feature: Some(feature_id.to_string()),
            },
            other => other,
        }
    }
}

impl From<quick_xml::Error> for GmlError {
    fn from(value: quick_xml::Error) -> Self {
        Self::Xml(value.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for GmlError {
    fn from(value: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(value.to_string())
    }
}
