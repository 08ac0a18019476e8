//! Decoding of GML geometry elements into [`GeometryRecord`]s.

use std::str::FromStr;

use strata_types::{GeoPoint3d, GeometryRecord, LineString, MultiLineString};

use crate::crs::CrsContext;
use crate::decoder::CoordinateFormat;
use crate::document::XmlElement;
use crate::error::GmlError;
use crate::is_gml_namespace;

/// Geometry elements the reader can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    /// `gml:Point`
    Point,
    /// `gml:MultiPoint`
    MultiPoint,
    /// `gml:LineString`
    LineString,
    /// `gml:MultiLineString`
    MultiLineString,
}

impl FromStr for GeometryKind {
    type Err = GmlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Point" => GeometryKind::Point,
            "MultiPoint" => GeometryKind::MultiPoint,
            "LineString" => GeometryKind::LineString,
            "MultiLineString" => GeometryKind::MultiLineString,
            other => return Err(GmlError::UnknownGeometryType(other.to_string())),
        })
    }
}

impl GeometryKind {
    /// Decodes `element`, which must be a geometry of this kind, in the given context.
    ///
    /// A multi point produces one [`GeometryRecord::Point`] per member; other kinds produce a
    /// single record.
    pub fn decode(
        self,
        element: &XmlElement,
        context: &CrsContext,
    ) -> Result<Vec<GeometryRecord>, GmlError> {
        let context = context.resolve(element)?;
        Ok(match self {
            GeometryKind::Point => vec![GeometryRecord::Point(decode_point(element, &context)?)],
            GeometryKind::MultiPoint => {
                let mut points = vec![];
                for point in members(element, "pointMember", "pointMembers") {
                    expect_tag(point, "Point")?;
                    let context = context.resolve(point)?;
                    points.push(GeometryRecord::Point(decode_point(point, &context)?));
                }

                points
            }
            GeometryKind::LineString => vec![GeometryRecord::LineString(decode_line_string(
                element, &context,
            )?)],
            GeometryKind::MultiLineString => {
                let mut parts = vec![];
                for line in members(element, "lineStringMember", "lineStringMembers") {
                    expect_tag(line, "LineString")?;
                    let context = context.resolve(line)?;
                    parts.push(decode_line_string(line, &context)?);
                }

                vec![GeometryRecord::MultiLineString(MultiLineString::new(parts))]
            }
        })
    }
}

/// Children of the member elements of a multi geometry.
///
/// The plural container is used only if the element has no singular member elements.
pub(crate) fn members<'a>(
    element: &'a XmlElement,
    singular: &'a str,
    plural: &'a str,
) -> impl Iterator<Item = &'a XmlElement> + 'a {
    let has_singular = element
        .child_elements()
        .any(|child| child.is(is_gml_namespace, singular));
    let container = if has_singular { singular } else { plural };

    element
        .child_elements()
        .filter(move |child| child.is(is_gml_namespace, container))
        .flat_map(|member| member.child_elements())
}

fn expect_tag(element: &XmlElement, local_name: &str) -> Result<(), GmlError> {
    if element.local_name() != local_name {
        return Err(GmlError::InvalidGeometry(format!(
            "expected {local_name}, found {}",
            element.local_name()
        )));
    }

    Ok(())
}

/// Coordinate strings of a geometry element with their format and context.
fn coordinate_strings(
    element: &XmlElement,
    context: &CrsContext,
) -> Result<Vec<(String, CoordinateFormat, CrsContext)>, GmlError> {
    let first = element.first_child_element().ok_or_else(|| {
        GmlError::InvalidGeometry(format!("{} has no coordinates", element.local_name()))
    })?;

    match first.local_name() {
        "coordinates" => Ok(vec![(
            first.text_content().into_owned(),
            CoordinateFormat::of_coordinates(first),
            context.resolve(first)?,
        )]),
        "posList" => Ok(vec![(
            first.text_content().into_owned(),
            CoordinateFormat::Flat,
            context.resolve(first)?,
        )]),
        "pos" => element
            .child_elements()
            .filter(|child| child.local_name() == "pos")
            .map(|pos| {
                Ok((
                    pos.text_content().into_owned(),
                    CoordinateFormat::Flat,
                    context.resolve(pos)?,
                ))
            })
            .collect(),
        other => Err(GmlError::InvalidGeometry(format!(
            "unexpected {other} element in {}",
            element.local_name()
        ))),
    }
}

fn decode_point(element: &XmlElement, context: &CrsContext) -> Result<GeoPoint3d, GmlError> {
    match coordinate_strings(element, context)?.as_slice() {
        [(text, format, context)] => format.decode_point(text, context),
        strings => Err(GmlError::InvalidGeometry(format!(
            "point must have exactly one position, but has {}",
            strings.len()
        ))),
    }
}

fn decode_line_string(element: &XmlElement, context: &CrsContext) -> Result<LineString, GmlError> {
    let mut points = vec![];
    for (text, format, context) in coordinate_strings(element, context)? {
        points.extend(format.decode_line_string(&text, &context)?);
    }

    Ok(LineString::new(points))
}
