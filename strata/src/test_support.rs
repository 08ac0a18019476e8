//! Test doubles of the layer collaborators.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use nalgebra::Vector3;
use parking_lot::Mutex;
use strata_gml::Properties;
use strata_types::{BoundingBox, GeoPoint2d, GeometryRecord, NewGeoPoint};
use tokio::sync::Notify;

use crate::error::StrataError;
use crate::render::RenderSink;
use crate::transport::Transport;
use crate::view::{ViewState, ViewportSource};

pub(crate) enum MockResponse {
    Body(String),
    Error(String),
    Hang,
}

#[derive(Default)]
struct MockTransportState {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<String>>,
    gate: Option<Arc<Notify>>,
}

/// Answers requests with queued responses. Requests beyond the queue get an empty collection.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<MockTransportState>,
}

impl MockTransport {
    pub(crate) fn new(responses: impl IntoIterator<Item = MockResponse>) -> Self {
        Self {
            state: Arc::new(MockTransportState {
                responses: Mutex::new(responses.into_iter().collect()),
                ..Default::default()
            }),
        }
    }

    /// Every request waits for a permit of the returned `Notify` before it is answered.
    pub(crate) fn gated(responses: impl IntoIterator<Item = MockResponse>) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let transport = Self {
            state: Arc::new(MockTransportState {
                responses: Mutex::new(responses.into_iter().collect()),
                requests: Mutex::default(),
                gate: Some(gate.clone()),
            }),
        };

        (transport, gate)
    }

    pub(crate) fn push(&self, response: MockResponse) {
        self.state.responses.lock().push_back(response);
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.state.requests.lock().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch_text(&self, url: &str) -> Result<String, StrataError> {
        self.state.requests.lock().push(url.to_string());
        if let Some(gate) = &self.state.gate {
            gate.notified().await;
        }

        let response = self.state.responses.lock().pop_front();
        match response {
            Some(MockResponse::Body(body)) => Ok(body),
            Some(MockResponse::Error(message)) => Err(StrataError::Transport(message)),
            Some(MockResponse::Hang) => std::future::pending().await,
            None => Ok(collection(&[])),
        }
    }
}

/// Camera that stays where the test puts it.
#[derive(Clone)]
pub(crate) struct StaticViewport {
    state: Arc<Mutex<(ViewState, BoundingBox)>>,
}

impl StaticViewport {
    pub(crate) fn new(bbox: BoundingBox) -> Self {
        Self {
            state: Arc::new(Mutex::new((view_at(0.0), bbox))),
        }
    }

    pub(crate) fn move_to(&self, x: f64) {
        self.state.lock().0 = view_at(x);
    }

    pub(crate) fn set_bbox(&self, bbox: BoundingBox) {
        self.state.lock().1 = bbox;
    }
}

impl ViewportSource for StaticViewport {
    fn current_view(&self) -> ViewState {
        self.state.lock().0
    }

    fn project_screen_corners(&self) -> BoundingBox {
        self.state.lock().1
    }
}

/// Keeps every presented feature.
#[derive(Clone, Default)]
pub(crate) struct RecordingSink {
    presented: Arc<Mutex<Vec<(Vec<GeometryRecord>, Properties)>>>,
}

impl RecordingSink {
    pub(crate) fn presented(&self) -> Vec<(Vec<GeometryRecord>, Properties)> {
        self.presented.lock().clone()
    }
}

impl RenderSink for RecordingSink {
    fn present(&self, geometries: &[GeometryRecord], properties: &Properties) {
        self.presented
            .lock()
            .push((geometries.to_vec(), properties.clone()));
    }
}

pub(crate) fn view_at(x: f64) -> ViewState {
    ViewState::new(
        Vector3::new(x, 0.0, 1e7),
        -Vector3::z(),
        Vector3::y(),
        Vector3::x(),
    )
}

pub(crate) fn europe() -> BoundingBox {
    BoundingBox::new(
        GeoPoint2d::latlon(40.0, -10.0),
        GeoPoint2d::latlon(50.0, 10.0),
    )
}

/// WFS 1.0 feature collection of `geo:rivers` features with the given ids.
pub(crate) fn collection(ids: &[&str]) -> String {
    let members: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<gml:featureMember>
                     <geo:rivers fid="{id}">
                       <geo:name>{id}</geo:name>
                       <geo:the_geom>
                         <gml:LineString srsName="EPSG:4326">
                           <gml:coordinates>2.0,1.0 3.0,1.5</gml:coordinates>
                         </gml:LineString>
                       </geo:the_geom>
                     </geo:rivers>
                   </gml:featureMember>"#
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
           <wfs:FeatureCollection xmlns:wfs="http://www.opengis.net/wfs"
                                  xmlns:gml="http://www.opengis.net/gml"
                                  xmlns:geo="http://example.com/geo">
             {members}
           </wfs:FeatureCollection>"#
    )
}
