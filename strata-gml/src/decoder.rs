//! Decoding of coordinate strings into points.

use strata_types::GeoPoint3d;

use crate::crs::CrsContext;
use crate::document::XmlElement;
use crate::error::GmlError;

/// Layout of a coordinate string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinateFormat {
    /// Content of a GML2 `coordinates` element: tuples separated by `ts` (any whitespace if not
    /// set), values inside a tuple separated by `cs`.
    Tuples {
        /// Value separator.
        cs: String,
        /// Tuple separator.
        ts: Option<String>,
    },
    /// Content of GML3 `pos` and `posList` elements: whitespace separated values, grouped into
    /// tuples by the context dimension.
    Flat,
}

impl Default for CoordinateFormat {
    fn default() -> Self {
        Self::Tuples {
            cs: ",".into(),
            ts: None,
        }
    }
}

impl CoordinateFormat {
    /// Format declared by a `coordinates` element through its `cs` and `ts` attributes.
    pub fn of_coordinates(element: &XmlElement) -> Self {
        let cs = element
            .attribute("cs")
            .filter(|cs| !cs.is_empty())
            .unwrap_or(",");
        let ts = element
            .attribute("ts")
            .filter(|ts| !ts.trim().is_empty())
            .map(str::to_string);

        Self::Tuples {
            cs: cs.to_string(),
            ts,
        }
    }

    fn tuples<'a>(
        &self,
        text: &'a str,
        context: &CrsContext,
    ) -> Result<Vec<Vec<&'a str>>, GmlError> {
        let expected = context.dimension().axes();
        match self {
            CoordinateFormat::Tuples { cs, ts } => {
                let groups: Vec<&str> = match ts {
                    Some(ts) => text
                        .split(ts.as_str())
                        .map(str::trim)
                        .filter(|group| !group.is_empty())
                        .collect(),
                    None => text.split_whitespace().collect(),
                };

                groups
                    .into_iter()
                    .map(|group| {
                        let values: Vec<&str> = group.split(cs.as_str()).collect();
                        if values.len() != expected {
                            return Err(GmlError::CoordinateArity {
                                expected,
                                found: values.len(),
                                tuple: group.to_string(),
                            });
                        }

                        Ok(values)
                    })
                    .collect()
            }
            CoordinateFormat::Flat => {
                let values: Vec<&str> = text.split_whitespace().collect();
                let remainder = values.len() % expected;
                if remainder != 0 {
                    let tail = &values[values.len() - remainder..];
                    return Err(GmlError::CoordinateArity {
                        expected,
                        found: remainder,
                        tuple: tail.join(" "),
                    });
                }

                Ok(values.chunks(expected).map(<[&str]>::to_vec).collect())
            }
        }
    }

    fn points(&self, text: &str, context: &CrsContext) -> Result<Vec<GeoPoint3d>, GmlError> {
        let tuples = self.tuples(text, context)?;
        if tuples.is_empty() {
            return Err(GmlError::InvalidGeometry("empty coordinate string".into()));
        }

        let mut points = Vec::with_capacity(tuples.len());
        let mut axes = Vec::with_capacity(context.dimension().axes());
        for tuple in tuples {
            axes.clear();
            for token in tuple {
                axes.push(parse_value(token)?);
            }

            let point = context.point(&axes).ok_or_else(|| {
                GmlError::InvalidGeometry(format!("cannot convert {axes:?} into a point"))
            })?;
            points.push(point);
        }

        Ok(points)
    }

    /// Decodes a string holding exactly one coordinate tuple.
    ///
    /// Points are placed on the ellipsoid surface: a height value of a 3d tuple is validated but
    /// not kept.
    pub fn decode_point(&self, text: &str, context: &CrsContext) -> Result<GeoPoint3d, GmlError> {
        match self.points(text, context)?.as_slice() {
            [point] => Ok(point.on_surface()),
            points => Err(GmlError::InvalidGeometry(format!(
                "point must have exactly one coordinate tuple, but has {}",
                points.len()
            ))),
        }
    }

    /// Decodes a string of one or more coordinate tuples, keeping their order.
    pub fn decode_line_string(
        &self,
        text: &str,
        context: &CrsContext,
    ) -> Result<Vec<GeoPoint3d>, GmlError> {
        self.points(text, context)
    }
}

fn parse_value(token: &str) -> Result<f64, GmlError> {
    match token.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(GmlError::CoordinateParse {
            token: token.to_string(),
            feature: None,
        }),
    }
}

/// Decodes the content of a GML2 `coordinates` element holding a single tuple, e.g. `"10,20"`.
pub fn decode_point(text: &str, context: &CrsContext) -> Result<GeoPoint3d, GmlError> {
    CoordinateFormat::default().decode_point(text, context)
}

/// Decodes the content of a GML2 `coordinates` element, e.g. `"10,20 11,21 12,22"`.
pub fn decode_line_string(text: &str, context: &CrsContext) -> Result<Vec<GeoPoint3d>, GmlError> {
    CoordinateFormat::default().decode_line_string(text, context)
}
