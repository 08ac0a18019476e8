//! Reader of GML feature collections returned by Web Feature Service `GetFeature` requests.
//!
//! The document is read into an [`XmlElement`] tree, and [`FeatureParser`] walks its feature
//! members producing [`FeatureRecord`]s: flat and nested properties plus decoded geometries.
//! Coordinates are interpreted according to the [`CrsContext`] declared on the collection, the
//! feature or the geometry element itself.
//!
//! ```
//! use strata_gml::FeatureParser;
//!
//! let gml = r#"
//!   <wfs:FeatureCollection xmlns:wfs="http://www.opengis.net/wfs" xmlns:gml="http://www.opengis.net/gml">
//!     <gml:featureMember>
//!       <topp:roads xmlns:topp="http://www.openplans.org/topp" fid="roads.1">
//!         <topp:the_geom>
//!           <gml:LineString><gml:coordinates>10,20 11,21</gml:coordinates></gml:LineString>
//!         </topp:the_geom>
//!       </topp:roads>
//!     </gml:featureMember>
//!   </wfs:FeatureCollection>"#;
//!
//! let collection = FeatureParser::default().parse_str(gml, |_| true).unwrap();
//! assert_eq!(collection.features.len(), 1);
//! ```

mod crs;
mod decoder;
mod document;
pub mod error;
mod feature;
mod geometry;
mod parser;

pub use crs::{CrsContext, Dimension};
pub use decoder::{decode_line_string, decode_point, CoordinateFormat};
pub use document::{XmlAttribute, XmlElement, XmlNode};
pub use error::GmlError;
pub use feature::{FeatureId, FeatureRecord, Properties, PropertyValue};
pub use geometry::GeometryKind;
pub use parser::{FeatureCollection, FeatureParser};

/// Namespace of GML 2 and GML 3.1 elements.
pub const GML_NAMESPACE: &str = "http://www.opengis.net/gml";

/// Namespace of GML 3.2 elements.
pub const GML32_NAMESPACE: &str = "http://www.opengis.net/gml/3.2";

/// Returns true if `namespace` is one of the GML namespaces.
pub fn is_gml_namespace(namespace: Option<&str>) -> bool {
    matches!(namespace, Some(GML_NAMESPACE | GML32_NAMESPACE))
}
