use std::collections::{HashMap, HashSet};

use crate::crs::{resolve_over, CrsContext};
use crate::document::XmlElement;
use crate::error::GmlError;
use crate::feature::{FeatureId, FeatureRecord, Properties, PropertyValue};
use crate::geometry::{members, GeometryKind};
use crate::is_gml_namespace;

/// Result of reading a feature collection document.
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    /// Decoded features in document order.
    pub features: Vec<FeatureRecord>,
    /// Number of features that were not decoded because their id was already seen, either earlier
    /// in the same document or, according to the caller's filter, in a previous one.
    pub duplicates: usize,
    /// Recoverable errors of skipped features and geometries.
    pub skipped: Vec<GmlError>,
}

/// Reads WFS feature collections.
///
/// Features are taken from `gml:featureMember` elements, or from a `gml:featureMembers` container
/// if the document has no singular members. For every feature the parser
///
/// 1. reads its id (`fid`, `gml:id` or the first attribute) and asks the caller whether the feature
///    should be decoded at all;
/// 2. splits its children into flat properties, nested property groups and geometry elements (the
///    GML-namespaced grandchildren); a `gml:boundedBy` child only changes the feature's CRS context;
/// 3. decodes the geometry elements in order.
///
/// Errors that concern a single feature or geometry are recoverable. With
/// `skip_recoverable_errors` they are logged and collected in [`FeatureCollection::skipped`],
/// otherwise the first one is returned. Unknown geometry types are always skipped.
#[derive(Debug, Clone, Copy)]
pub struct FeatureParser {
    skip_recoverable_errors: bool,
}

impl Default for FeatureParser {
    fn default() -> Self {
        Self::new(true)
    }
}

impl FeatureParser {
    /// Creates a new parser.
    pub fn new(skip_recoverable_errors: bool) -> Self {
        Self {
            skip_recoverable_errors,
        }
    }

    /// Parses the document text and reads the feature collection from it.
    ///
    /// See [`FeatureParser::parse`].
    pub fn parse_str(
        &self,
        text: &str,
        is_new: impl FnMut(&FeatureId) -> bool,
    ) -> Result<FeatureCollection, GmlError> {
        let document = XmlElement::parse(text)?;
        self.parse(&document, is_new)
    }

    /// Reads the feature collection from the document root.
    ///
    /// `is_new` is called once for every distinct feature id before the feature is decoded. If it
    /// returns `false`, the feature is counted as a duplicate and skipped.
    pub fn parse(
        &self,
        document: &XmlElement,
        mut is_new: impl FnMut(&FeatureId) -> bool,
    ) -> Result<FeatureCollection, GmlError> {
        if matches!(
            document.local_name(),
            "ServiceExceptionReport" | "ExceptionReport"
        ) {
            return Err(GmlError::ServiceException(
                document.text_content().trim().to_string(),
            ));
        }

        let document_context = document
            .child_elements()
            .find(|child| child.is(is_gml_namespace, "boundedBy"))
            .and_then(|bounded_by| bounded_by.first_child_element())
            .map_or(Ok(CrsContext::default()), |envelope| {
                CrsContext::default().resolve(envelope)
            });
        if let Err(error) = &document_context {
            log::warn!("Collection CRS cannot be used: {error}");
        }

        let mut collection = FeatureCollection::default();
        let mut seen = HashSet::new();

        for feature in members(document, "featureMember", "featureMembers") {
            let id = match feature_id(feature) {
                Ok(id) => id,
                Err(error) => {
                    self.recover(error, &mut collection.skipped)?;
                    continue;
                }
            };

            if !seen.insert(id.key()) || !is_new(&id) {
                log::trace!("Feature {id} is already loaded");
                collection.duplicates += 1;
                continue;
            }

            match self.parse_feature(feature, id, &document_context, &mut collection.skipped) {
                Ok(record) => collection.features.push(record),
                Err(error) => self.recover(error, &mut collection.skipped)?,
            }
        }

        log::debug!(
            "Read {} features ({} duplicates, {} errors skipped)",
            collection.features.len(),
            collection.duplicates,
            collection.skipped.len()
        );

        Ok(collection)
    }

    fn parse_feature(
        &self,
        feature: &XmlElement,
        id: FeatureId,
        document_context: &Result<CrsContext, GmlError>,
        skipped: &mut Vec<GmlError>,
    ) -> Result<FeatureRecord, GmlError> {
        let mut context = document_context.clone();
        let mut properties = Properties::new();
        let mut geometry_elements = vec![];

        for child in feature.child_elements() {
            if child.is(is_gml_namespace, "boundedBy") {
                if let Some(envelope) = child.first_child_element() {
                    context = resolve_over(&context, envelope);
                }

                continue;
            }

            if !child.has_child_elements() {
                properties.insert(
                    child.local_name().to_string(),
                    PropertyValue::Text(child.text_content().into_owned()),
                );
                continue;
            }

            let mut group = HashMap::new();
            for nested in child.child_elements() {
                if is_gml_namespace(nested.namespace()) {
                    geometry_elements.push(nested);
                } else {
                    group.insert(
                        nested.local_name().to_string(),
                        nested.text_content().into_owned(),
                    );
                }
            }

            if !group.is_empty() {
                properties.insert(child.local_name().to_string(), PropertyValue::Group(group));
            }
        }

        let context = context?;
        let mut geometries = vec![];
        for element in geometry_elements {
            let decoded = element
                .local_name()
                .parse::<GeometryKind>()
                .and_then(|kind| kind.decode(element, &context));

            match decoded {
                Ok(records) => geometries.extend(records),
                Err(error @ GmlError::UnknownGeometryType(_)) => {
                    log::warn!("Skipping geometry of feature {id}: {error}");
                    skipped.push(error);
                }
                Err(error) => self.recover(error.in_feature(id.as_str()), skipped)?,
            }
        }

        Ok(FeatureRecord {
            id,
            properties,
            geometries,
        })
    }

    fn recover(&self, error: GmlError, skipped: &mut Vec<GmlError>) -> Result<(), GmlError> {
        if !self.skip_recoverable_errors {
            return Err(error);
        }

        log::warn!("Skipping invalid feature data: {error}");
        skipped.push(error);
        Ok(())
    }
}

fn feature_id(feature: &XmlElement) -> Result<FeatureId, GmlError> {
    let raw = feature
        .attribute("fid")
        .or_else(|| feature.attribute_by_local_name("id"))
        .or_else(|| feature.attributes().first().map(|attr| attr.value()))
        .ok_or_else(|| {
            GmlError::InvalidFeatureId(format!("<{} without id>", feature.local_name()))
        })?;

    raw.parse()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    use strata_types::{GeoPoint, GeoPoint3d, GeometryRecord};

    use super::*;

    fn collection(members: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <wfs:FeatureCollection xmlns:wfs="http://www.opengis.net/wfs"
                                   xmlns:gml="http://www.opengis.net/gml"
                                   xmlns:geo="http://example.com/geo">
                <gml:boundedBy>
                    <gml:Box srsName="EPSG:4326"><gml:coordinates>0,0 20,20</gml:coordinates></gml:Box>
                </gml:boundedBy>
                {members}
            </wfs:FeatureCollection>"#
        )
    }

    fn contour(id: &str, coordinates: &str) -> String {
        format!(
            r#"<gml:featureMember>
                <geo:contour fid="{id}">
                    <geo:the_geom>
                        <gml:LineString><gml:coordinates>{coordinates}</gml:coordinates></gml:LineString>
                    </geo:the_geom>
                    <geo:depth>10</geo:depth>
                </geo:contour>
            </gml:featureMember>"#
        )
    }

    fn parse_all(text: &str) -> FeatureCollection {
        FeatureParser::default()
            .parse_str(text, |_| true)
            .expect("failed to parse")
    }

    #[test]
    fn repeated_ids_are_admitted_once() {
        let text = collection(
            &[
                contour("contour.1", "0,0 1,1"),
                contour("contour.2", "2,2 3,3"),
                contour("contour.1", "4,4 5,5"),
            ]
            .concat(),
        );

        let result = parse_all(&text);
        let ids: Vec<_> = result.features.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["contour.1", "contour.2"]);
        assert_eq!(result.duplicates, 1);
        assert!(result.skipped.is_empty());

        let GeometryRecord::LineString(line) = &result.features[0].geometries[0] else {
            panic!("invalid geometry type");
        };
        assert_abs_diff_eq!(line.points()[1], GeoPoint3d::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn filter_is_consulted_before_decoding() {
        let text = collection(
            &[
                contour("contour.1", "not numbers"),
                contour("contour.2", "2,2 3,3"),
            ]
            .concat(),
        );

        let mut asked = vec![];
        let result = FeatureParser::new(false)
            .parse_str(&text, |id| {
                asked.push(id.key());
                id.key() != 1
            })
            .expect("failed to parse");

        assert_eq!(asked, [1, 2]);
        assert_eq!(result.features.len(), 1);
        assert_eq!(result.duplicates, 1);
    }

    #[test]
    fn properties_are_separated_from_geometries() {
        let text = collection(
            r#"<gml:featureMember>
                <geo:river fid="river.3">
                    <gml:boundedBy><gml:null>unknown</gml:null></gml:boundedBy>
                    <geo:name>Tiber</geo:name>
                    <geo:length> 405 km </geo:length>
                    <geo:source>
                        <geo:country>Italy</geo:country>
                        <geo:region>Emilia-Romagna</geo:region>
                    </geo:source>
                    <geo:geometry>
                        <gml:Point><gml:coordinates>11.93,43.78</gml:coordinates></gml:Point>
                    </geo:geometry>
                </geo:river>
            </gml:featureMember>"#,
        );

        let result = parse_all(&text);
        let feature = &result.features[0];

        assert_eq!(feature.properties.len(), 3);
        assert!(!feature.properties.contains_key("boundedBy"));
        assert!(!feature.properties.contains_key("geometry"));
        assert_eq!(
            feature.properties["name"],
            PropertyValue::Text("Tiber".into())
        );
        assert_eq!(feature.properties["length"].as_text(), Some(" 405 km "));

        let source = feature.properties["source"].as_group().expect("not a group");
        assert_eq!(source.len(), 2);
        assert_eq!(source["country"], "Italy");
        assert_eq!(source["region"], "Emilia-Romagna");

        assert_eq!(
            feature.geometries,
            vec![GeometryRecord::Point(GeoPoint3d::new(11.93, 43.78, 0.0))]
        );
    }

    #[test]
    fn geometries_keep_element_order() {
        let text = collection(
            r#"<gml:featureMember>
                <geo:station fid="station.1">
                    <geo:track>
                        <gml:LineString><gml:coordinates>0,0 1,1</gml:coordinates></gml:LineString>
                    </geo:track>
                    <geo:position>
                        <gml:Point><gml:coordinates>5,6</gml:coordinates></gml:Point>
                    </geo:position>
                </geo:station>
            </gml:featureMember>"#,
        );

        let geometries = &parse_all(&text).features[0].geometries;
        assert_matches!(geometries[0], GeometryRecord::LineString(_));
        assert_matches!(geometries[1], GeometryRecord::Point(p) if p.lon() == 5.0);
    }

    #[test]
    fn unsupported_crs_skips_only_that_feature() {
        let text = collection(
            &(r#"<gml:featureMember>
                <geo:contour fid="contour.1">
                    <gml:boundedBy>
                        <gml:Box srsName="EPSG:3857"><gml:coordinates>0,0 1,1</gml:coordinates></gml:Box>
                    </gml:boundedBy>
                    <geo:the_geom>
                        <gml:LineString><gml:coordinates>0,0 1,1</gml:coordinates></gml:LineString>
                    </geo:the_geom>
                </geo:contour>
            </gml:featureMember>"#
                .to_string()
                + &contour("contour.2", "2,2 3,3")),
        );

        let result = parse_all(&text);
        assert_eq!(result.features.len(), 1);
        assert_eq!(result.features[0].id.as_str(), "contour.2");
        assert_eq!(
            result.skipped,
            vec![GmlError::UnsupportedCrs("EPSG:3857".into())]
        );
    }

    #[test]
    fn unsupported_collection_crs_is_overridable() {
        let text = r#"<wfs:FeatureCollection xmlns:wfs="http://www.opengis.net/wfs" xmlns:gml="http://www.opengis.net/gml">
                <gml:boundedBy><gml:Box srsName="EPSG:3857"/></gml:boundedBy>
                <gml:featureMember>
                    <a fid="a.1"><g><gml:Point><gml:coordinates>1,2</gml:coordinates></gml:Point></g></a>
                </gml:featureMember>
                <gml:featureMember>
                    <a fid="a.2">
                        <gml:boundedBy><gml:Box srsName="urn:ogc:def:crs:EPSG::4326"/></gml:boundedBy>
                        <g><gml:Point><gml:coordinates>1,2</gml:coordinates></gml:Point></g>
                    </a>
                </gml:featureMember>
            </wfs:FeatureCollection>"#;

        let result = parse_all(text);
        assert_eq!(result.features.len(), 1);
        assert_eq!(result.features[0].id.key(), 2);
        assert_matches!(result.skipped[..], [GmlError::UnsupportedCrs(_)]);
    }

    #[test]
    fn feature_envelope_overrides_collection_dimension() {
        let text = collection(
            r#"<gml:featureMember>
                <geo:contour fid="contour.5">
                    <gml:boundedBy>
                        <gml:Box srsName="EPSG:4326" srsDimension="3">
                            <gml:coordinates>0,0,0 5,5,50</gml:coordinates>
                        </gml:Box>
                    </gml:boundedBy>
                    <geo:the_geom>
                        <gml:LineString><gml:coordinates>1,2,30 3,4,40</gml:coordinates></gml:LineString>
                    </geo:the_geom>
                </geo:contour>
            </gml:featureMember>
            <gml:featureMember>
                <geo:contour fid="contour.6">
                    <geo:the_geom>
                        <gml:LineString><gml:coordinates>1,2,30 3,4,40</gml:coordinates></gml:LineString>
                    </geo:the_geom>
                </geo:contour>
            </gml:featureMember>"#,
        );

        let result = parse_all(&text);
        assert_eq!(result.features.len(), 2);

        let GeometryRecord::LineString(line) = &result.features[0].geometries[0] else {
            panic!("invalid geometry type");
        };
        assert_abs_diff_eq!(line.points()[0], GeoPoint3d::new(1.0, 2.0, 30.0));
        assert_abs_diff_eq!(line.points()[1], GeoPoint3d::new(3.0, 4.0, 40.0));

        // The sibling keeps the two-dimensional collection context.
        assert!(result.features[1].geometries.is_empty());
        assert_matches!(
            result.skipped[..],
            [GmlError::CoordinateArity {
                expected: 2,
                found: 3,
                ..
            }]
        );
    }

    #[test]
    fn invalid_ids_are_skipped() {
        let text = collection(
            &[
                contour("contour", "0,0 1,1"),
                contour("contour.2", "2,2 3,3"),
            ]
            .concat(),
        );

        let result = parse_all(&text);
        assert_eq!(result.features.len(), 1);
        assert_eq!(
            result.skipped,
            vec![GmlError::InvalidFeatureId("contour".into())]
        );

        assert_eq!(
            FeatureParser::new(false)
                .parse_str(&text, |_| true)
                .map(|c| c.features.len()),
            Err(GmlError::InvalidFeatureId("contour".into()))
        );
    }

    #[test]
    fn invalid_geometry_is_skipped_with_feature_id() {
        let text = collection(&contour("contour.9", "0,0 1,east"));

        let result = parse_all(&text);
        assert_eq!(result.features.len(), 1);
        assert!(result.features[0].geometries.is_empty());
        assert_eq!(
            result.skipped,
            vec![GmlError::CoordinateParse {
                token: "east".into(),
                feature: Some("contour.9".into())
            }]
        );
    }

    #[test]
    fn unknown_geometry_type_is_a_warning() {
        let text = collection(
            r#"<gml:featureMember>
                <geo:lake fid="lake.1">
                    <geo:shape><gml:Polygon><gml:outerBoundaryIs/></gml:Polygon></geo:shape>
                    <geo:shore>
                        <gml:LineString><gml:coordinates>0,0 1,1</gml:coordinates></gml:LineString>
                    </geo:shore>
                </geo:lake>
            </gml:featureMember>"#,
        );

        let result = FeatureParser::new(false)
            .parse_str(&text, |_| true)
            .expect("failed to parse");
        assert_eq!(result.features[0].geometries.len(), 1);
        assert_eq!(
            result.skipped,
            vec![GmlError::UnknownGeometryType("Polygon".into())]
        );
    }

    #[test]
    fn plural_feature_members_and_gml3() {
        let text = r#"<wfs:FeatureCollection xmlns:wfs="http://www.opengis.net/wfs" xmlns:gml="http://www.opengis.net/gml/3.2">
                <gml:featureMembers>
                    <r gml:id="road.1"><g><gml:LineString srsDimension="3"><gml:posList>1 2 3 4 5 6</gml:posList></gml:LineString></g></r>
                    <r gml:id="road.2"><g><gml:Point><gml:pos>7 8</gml:pos></gml:Point></g></r>
                </gml:featureMembers>
            </wfs:FeatureCollection>"#;

        let result = parse_all(text);
        assert_eq!(result.features.len(), 2);
        assert_eq!(result.features[0].geometries[0].point_count(), 2);
        assert_eq!(
            result.features[1].geometries,
            vec![GeometryRecord::Point(GeoPoint3d::new(7.0, 8.0, 0.0))]
        );
    }

    #[test]
    fn empty_collection() {
        let result = parse_all(&collection(""));
        assert!(result.features.is_empty());
        assert_eq!(result.duplicates, 0);
    }

    #[test]
    fn exception_report() {
        let text = r#"<ServiceExceptionReport version="1.2.0">
                <ServiceException code="InvalidParameterValue">Unknown type name</ServiceException>
            </ServiceExceptionReport>"#;

        assert_eq!(
            FeatureParser::default().parse_str(text, |_| true).map(|_| ()),
            Err(GmlError::ServiceException("Unknown type name".into()))
        );
    }

    #[test]
    fn malformed_document() {
        assert_matches!(
            FeatureParser::default().parse_str("<wfs:FeatureCollection", |_| true),
            Err(GmlError::Xml(_))
        );
    }
}
