use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strata_types::GeometryRecord;

use crate::error::GmlError;

/// Identifier of a feature in the `<typeName>.<integer>` form, e.g. `contour.42`.
///
/// Two ids are the same feature if their integer parts are equal, see [`FeatureId::key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureId {
    raw: String,
    key: u64,
}

impl FeatureId {
    /// The id as it appears in the document.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Type name part of the id.
    pub fn type_name(&self) -> &str {
        self.raw
            .rsplit_once('.')
            .map(|(type_name, _)| type_name)
            .unwrap_or_default()
    }

    /// Integer part of the id. Features are deduplicated by this key.
    pub fn key(&self) -> u64 {
        self.key
    }
}

impl FromStr for FeatureId {
    type Err = GmlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GmlError::InvalidFeatureId(s.to_string());
        let (type_name, number) = s.rsplit_once('.').ok_or_else(invalid)?;
        if type_name.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let key = number.parse().map_err(|_| invalid())?;
        Ok(Self {
            raw: s.to_string(),
            key,
        })
    }
}

impl Display for FeatureId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Value of a non-spatial feature property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Text of an element without child elements, copied verbatim.
    Text(String),
    /// Property element with nested non-spatial children, one level deep.
    Group(HashMap<String, String>),
}

impl PropertyValue {
    /// Returns the text of a flat property.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(text) => Some(text),
            PropertyValue::Group(_) => None,
        }
    }

    /// Returns the members of a nested property.
    pub fn as_group(&self) -> Option<&HashMap<String, String>> {
        match self {
            PropertyValue::Group(group) => Some(group),
            PropertyValue::Text(_) => None,
        }
    }
}

/// Properties of a feature by element local name.
pub type Properties = HashMap<String, PropertyValue>;

/// Feature decoded from a feature collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Feature identifier.
    pub id: FeatureId,
    /// Non-spatial properties.
    pub properties: Properties,
    /// Geometries in the order their elements appear in the feature.
    pub geometries: Vec<GeometryRecord>,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_id() {
        let id: FeatureId = "depthContour.3438".parse().expect("invalid id");
        assert_eq!(id.as_str(), "depthContour.3438");
        assert_eq!(id.type_name(), "depthContour");
        assert_eq!(id.key(), 3438);
        assert_eq!(id.to_string(), "depthContour.3438");

        let id: FeatureId = "ns.roads.7".parse().expect("invalid id");
        assert_eq!(id.type_name(), "ns.roads");
        assert_eq!(id.key(), 7);
    }

    #[test]
    fn invalid_ids() {
        for id in ["contour", "contour.", ".5", "contour.x", "contour.-1", "contour.1.5a", ""] {
            assert_matches!(
                id.parse::<FeatureId>(),
                Err(GmlError::InvalidFeatureId(v)) if v == id
            );
        }
    }
}
