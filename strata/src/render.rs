//! Hand-off of decoded features to the rendering engine.

use strata_gml::Properties;
use strata_types::GeometryRecord;

/// Receiver of newly loaded features.
///
/// The layer calls [`present`](RenderSink::present) once for every admitted feature and does not
/// wait for anything to be drawn. Implementations convert the geometries into their own render
/// primitives.
pub trait RenderSink: Send + Sync {
    /// Adds the geometries of a feature to the scene.
    fn present(&self, geometries: &[GeometryRecord], properties: &Properties);
}

/// Render sink that only logs the features it receives.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRenderSink;

impl RenderSink for LogRenderSink {
    fn present(&self, geometries: &[GeometryRecord], properties: &Properties) {
        let points: usize = geometries.iter().map(GeometryRecord::point_count).sum();
        log::debug!(
            "Feature with {} geometries ({points} points) and {} properties",
            geometries.len(),
            properties.len()
        );
    }
}
