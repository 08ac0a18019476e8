//! Construction of WFS request urls.

use std::fmt::{Display, Formatter};

use strata_types::BoundingBox;

use crate::error::StrataError;

/// WFS version all requests are made with.
pub const WFS_VERSION: &str = "1.0.0";

/// Kind of a WFS request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WfsRequest {
    /// Description of the service and the feature types it offers.
    GetCapabilities,
    /// Schema of a feature type.
    DescribeFeatureType,
    /// Feature collection.
    GetFeature,
}

impl Display for WfsRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WfsRequest::GetCapabilities => "GetCapabilities",
            WfsRequest::DescribeFeatureType => "DescribeFeatureType",
            WfsRequest::GetFeature => "GetFeature",
        };
        f.write_str(name)
    }
}

/// Parameters of a single WFS request.
///
/// Parameters are written in a fixed order and are not percent-encoded, since layer names, ids and
/// numbers only contain characters allowed in a query string.
#[derive(Debug, Clone, PartialEq)]
pub struct WfsQuery {
    request: WfsRequest,
    type_name: Option<String>,
    max_features: Option<u32>,
    bbox: Option<[f64; 4]>,
    feature_ids: Vec<String>,
}

impl WfsQuery {
    fn new(request: WfsRequest) -> Self {
        Self {
            request,
            type_name: None,
            max_features: None,
            bbox: None,
            feature_ids: vec![],
        }
    }

    /// Kind of the request.
    pub fn request(&self) -> WfsRequest {
        self.request
    }

    /// Feature type the request is made for.
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Maximum number of features the server should return.
    pub fn max_features(&self) -> Option<u32> {
        self.max_features
    }

    /// Bounding box filter as `[sw_lon, sw_lat, ne_lon, ne_lat]`.
    pub fn bbox(&self) -> Option<[f64; 4]> {
        self.bbox
    }

    /// Requested feature ids.
    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    /// Query parameters in the order they appear in the url.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("service", "WFS".to_string()),
            ("version", WFS_VERSION.to_string()),
            ("request", self.request.to_string()),
        ];

        if let Some(type_name) = &self.type_name {
            params.push(("typeName", type_name.clone()));
        }

        if let Some(max_features) = self.max_features {
            params.push(("maxFeatures", max_features.to_string()));
        }

        if let Some([sw_lon, sw_lat, ne_lon, ne_lat]) = self.bbox {
            params.push(("bbox", format!("{sw_lon},{sw_lat},{ne_lon},{ne_lat}")));
        }

        if !self.feature_ids.is_empty() {
            params.push(("featureID", self.feature_ids.join(",")));
        }

        params
    }

    /// Full request url for the service at `base_url`.
    pub fn to_url(&self, base_url: &str) -> String {
        let query = self
            .params()
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}/wfs?{query}", base_url.trim_end_matches('/'))
    }
}

/// Builds a `GetFeature` query for the layer.
///
/// Returns [`StrataError::InvalidViewportProjection`] if a bounding box is given but it is not
/// valid. In this case no request must be made.
pub fn build_query(
    layer: &str,
    bbox: Option<&BoundingBox>,
    max_features: u32,
) -> Result<WfsQuery, StrataError> {
    let mut query = WfsQuery::new(WfsRequest::GetFeature);
    query.type_name = Some(layer.to_string());
    query.max_features = Some(max_features);

    if let Some(bbox) = bbox {
        query.bbox = Some(bbox.corners().ok_or(StrataError::InvalidViewportProjection)?);
    }

    Ok(query)
}

/// Produces the urls of all requests a layer makes to the service.
#[derive(Debug, Clone)]
pub struct RequestController {
    base_url: String,
    layer: String,
    max_features: u32,
    bbox_filter: bool,
}

impl RequestController {
    /// Creates a controller for the `layer` of the service at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        layer: impl Into<String>,
        max_features: u32,
        bbox_filter: bool,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            layer: layer.into(),
            max_features,
            bbox_filter,
        }
    }

    /// Service url without the trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Layer name in the `namespace:layerName` form.
    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// Maximum number of features requested by a viewport query.
    pub fn max_features(&self) -> u32 {
        self.max_features
    }

    /// Sets the maximum number of features requested by a viewport query.
    pub fn set_max_features(&mut self, max_features: u32) {
        self.max_features = max_features;
    }

    /// Whether viewport queries are filtered by the visible bounding box.
    pub fn bbox_filter(&self) -> bool {
        self.bbox_filter
    }

    /// Url of the features in the visible region.
    ///
    /// The `bbox` is only used if bounding box filtering is enabled.
    pub fn features_url(&self, bbox: &BoundingBox) -> Result<String, StrataError> {
        let bbox = self.bbox_filter.then_some(bbox);
        let query = build_query(&self.layer, bbox, self.max_features)?;
        Ok(query.to_url(&self.base_url))
    }

    /// Url of the service capabilities document.
    pub fn capabilities_url(&self) -> String {
        WfsQuery::new(WfsRequest::GetCapabilities).to_url(&self.base_url)
    }

    /// Url of the layer's feature type description.
    pub fn describe_url(&self) -> String {
        let mut query = WfsQuery::new(WfsRequest::DescribeFeatureType);
        query.type_name = Some(self.layer.clone());
        query.to_url(&self.base_url)
    }

    /// Query of the features with the given ids.
    pub fn features_by_ids_query<S: AsRef<str>>(&self, ids: &[S]) -> WfsQuery {
        let mut query = WfsQuery::new(WfsRequest::GetFeature);
        query.type_name = Some(self.layer.clone());
        query.feature_ids = ids.iter().map(|id| id.as_ref().to_string()).collect();
        query
    }

    /// Url of the features with the given ids.
    pub fn features_by_ids_url<S: AsRef<str>>(&self, ids: &[S]) -> String {
        self.features_by_ids_query(ids).to_url(&self.base_url)
    }

    /// Url of a single feature.
    pub fn feature_by_id_url(&self, id: &str) -> String {
        self.features_by_ids_url(&[id])
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use strata_types::{GeoPoint2d, NewGeoPoint};

    use super::*;

    fn rivers_bbox() -> BoundingBox {
        BoundingBox::new(
            GeoPoint2d::latlon(40.0, -10.0),
            GeoPoint2d::latlon(50.0, 10.0),
        )
    }

    #[test]
    fn query_with_bbox() {
        let query = build_query("geo:rivers", Some(&rivers_bbox()), 100).unwrap();
        assert_eq!(query.request(), WfsRequest::GetFeature);
        assert_eq!(query.type_name(), Some("geo:rivers"));
        assert_eq!(query.max_features(), Some(100));
        assert_eq!(query.bbox(), Some([-10.0, 40.0, 10.0, 50.0]));
        assert!(query.feature_ids().is_empty());

        let params = query.params();

        assert!(params.contains(&("typeName", "geo:rivers".to_string())));
        assert!(params.contains(&("maxFeatures", "100".to_string())));
        assert!(params.contains(&("bbox", "-10,40,10,50".to_string())));
        assert_eq!(
            query.to_url("http://example.com/geoserver"),
            "http://example.com/geoserver/wfs?service=WFS&version=1.0.0&request=GetFeature\
             &typeName=geo:rivers&maxFeatures=100&bbox=-10,40,10,50"
        );
    }

    #[test]
    fn query_without_bbox() {
        let query = build_query("geo:rivers", None, 10).unwrap();
        assert_eq!(query.bbox(), None);
        assert_eq!(
            query.to_url("http://example.com"),
            "http://example.com/wfs?service=WFS&version=1.0.0&request=GetFeature\
             &typeName=geo:rivers&maxFeatures=10"
        );
    }

    #[test]
    fn invalid_bbox_is_rejected() {
        let result = build_query("geo:rivers", Some(&BoundingBox::invalid()), 100);
        assert_matches!(result, Err(StrataError::InvalidViewportProjection));
    }

    #[test]
    fn fractional_bbox() {
        let bbox = BoundingBox::new(
            GeoPoint2d::latlon(-33.5, 151.25),
            GeoPoint2d::latlon(-33.75, 151.5),
        );
        let query = build_query("geo:roads", Some(&bbox), 1).unwrap();
        assert!(query
            .params()
            .contains(&("bbox", "151.25,-33.5,151.5,-33.75".to_string())));
    }

    #[test]
    fn controller_trims_base_url() {
        let controller =
            RequestController::new("http://example.com/geoserver//", "geo:rivers", 5, true);
        assert_eq!(controller.base_url(), "http://example.com/geoserver");
        assert_eq!(
            controller.capabilities_url(),
            "http://example.com/geoserver/wfs?service=WFS&version=1.0.0&request=GetCapabilities"
        );
    }

    #[test]
    fn controller_direct_queries() {
        let controller = RequestController::new("http://example.com", "geo:rivers", 5, true);
        assert_eq!(
            controller.describe_url(),
            "http://example.com/wfs?service=WFS&version=1.0.0&request=DescribeFeatureType\
             &typeName=geo:rivers"
        );
        let query = controller.features_by_ids_query(&["rivers.1", "rivers.7"]);
        assert_eq!(query.feature_ids(), ["rivers.1", "rivers.7"]);
        assert_eq!(query.max_features(), None);
        assert_eq!(query.bbox(), None);

        assert_eq!(
            controller.features_by_ids_url(&["rivers.1", "rivers.7"]),
            "http://example.com/wfs?service=WFS&version=1.0.0&request=GetFeature\
             &typeName=geo:rivers&featureID=rivers.1,rivers.7"
        );
        assert_eq!(
            controller.feature_by_id_url("rivers.3"),
            "http://example.com/wfs?service=WFS&version=1.0.0&request=GetFeature\
             &typeName=geo:rivers&featureID=rivers.3"
        );
    }

    #[test]
    fn controller_without_bbox_filter_ignores_invalid_bbox() {
        let controller = RequestController::new("http://example.com", "geo:rivers", 5, false);
        let url = controller.features_url(&BoundingBox::invalid()).unwrap();
        assert!(!url.contains("bbox="));
        assert!(url.ends_with("maxFeatures=5"));
    }

    #[test]
    fn controller_with_bbox_filter() {
        let mut controller = RequestController::new("http://example.com", "geo:rivers", 5, true);
        controller.set_max_features(100);
        let url = controller.features_url(&rivers_bbox()).unwrap();
        assert!(url.ends_with("&maxFeatures=100&bbox=-10,40,10,50"));
        assert_matches!(
            controller.features_url(&BoundingBox::invalid()),
            Err(StrataError::InvalidViewportProjection)
        );
    }
}
