//! Strata loads vector features from a Web Feature Service (WFS) for the region a 3D globe camera
//! is looking at, and hands them to a rendering engine.
//!
//! # Quick start
//!
//! ```no_run
//! use strata::layer::WfsLayerBuilder;
//! # fn viewport() -> impl strata::view::ViewportSource { unimplemented!() }
//!
//! # tokio_test::block_on(async {
//! let layer = WfsLayerBuilder::new("https://example.com/geoserver", "geo:rivers")
//!     .with_max_features(300)
//!     .build(viewport())?;
//!
//! // Once per frame:
//! layer.tick();
//! # Ok::<(), strata::error::StrataError>(())
//! # });
//! ```
//!
//! # How features get loaded
//!
//! Every [`WfsLayer`] follows a camera given by a [`ViewportSource`](view::ViewportSource). On
//! each [`tick`](WfsLayer::tick) the layer's [`ViewportChangeDetector`] compares the camera with
//! the one of the last load. If it moved, a background task
//!
//! * projects the screen corners onto the ellipsoid and builds a `GetFeature` request for the
//!   resulting bounding box ([`RequestController`]),
//! * fetches the response with a [`Transport`](transport::Transport),
//! * reads the GML feature collection with [`strata_gml::FeatureParser`], skipping features the
//!   [`FeatureDeduplicator`] has already seen,
//! * presents the geometries of the new features to the [`RenderSink`](render::RenderSink).
//!
//! Only one such task runs at a time. Errors are logged and the next tick tries again.

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

pub(crate) mod async_runtime;
pub mod change_detector;
pub mod dedup;
pub mod error;
pub mod layer;
pub mod query;
pub mod render;
pub mod transport;
pub mod view;

#[cfg(test)]
mod test_support;

pub use change_detector::{DetectorState, ViewComparison, ViewportChangeDetector};
pub use dedup::FeatureDeduplicator;
pub use layer::{RefreshOutcome, WfsLayer, WfsLayerBuilder, WfsLayerOptions};
pub use query::{build_query, RequestController, WfsQuery, WfsRequest};

// Reexport dependent crates
pub use strata_gml;
pub use strata_types;
