//! Loads features of a WFS layer for a fixed camera and prints them.
//!
//! ```sh
//! RUST_LOG=info cargo run --example wfs_console -- https://ahocevar.com/geoserver topp:states
//! ```

use std::time::Duration;

use nalgebra::Vector3;
use strata::render::LogRenderSink;
use strata::strata_types::{BoundingBox, GeoPoint2d, NewGeoPoint};
use strata::view::{ViewState, ViewportSource};
use strata::{RefreshOutcome, WfsLayerBuilder};

/// Camera looking down at North America.
struct FixedViewport;

impl ViewportSource for FixedViewport {
    fn current_view(&self) -> ViewState {
        ViewState::new(
            Vector3::new(-1_500_000.0, -4_700_000.0, 5_000_000.0),
            Vector3::new(0.2, 0.6, -0.8),
            Vector3::z(),
            Vector3::x(),
        )
    }

    fn project_screen_corners(&self) -> BoundingBox {
        BoundingBox::new(
            GeoPoint2d::latlon(25.0, -125.0),
            GeoPoint2d::latlon(50.0, -65.0),
        )
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let url = args
        .next()
        .unwrap_or_else(|| "https://ahocevar.com/geoserver".to_string());
    let layer_name = args.next().unwrap_or_else(|| "topp:states".to_string());

    let layer = WfsLayerBuilder::new(url, layer_name)
        .with_max_features(50)
        .with_timeout(Duration::from_secs(20))
        .with_render_sink(LogRenderSink)
        .build(FixedViewport)
        .expect("invalid layer configuration");

    match layer.refresh().await {
        Ok(RefreshOutcome::Applied {
            admitted,
            duplicates,
            skipped,
        }) => {
            log::info!("Loaded {admitted} features ({duplicates} duplicates, {skipped} skipped)");
        }
        Ok(outcome) => log::info!("Nothing loaded: {outcome:?}"),
        Err(err) => {
            log::error!("Failed to load features: {err}");
            return;
        }
    }

    for feature in layer.features() {
        let points: usize = feature.geometries.iter().map(|g| g.point_count()).sum();
        let mut names: Vec<_> = feature.properties.keys().collect();
        names.sort();
        println!(
            "{}: {} geometries, {points} points, properties {names:?}",
            feature.id,
            feature.geometries.len()
        );
    }

    layer.shutdown();
}
