use std::time::Duration;

use serde::{Deserialize, Serialize};
use strata_gml::FeatureParser;

use super::WfsLayer;
use crate::change_detector::ViewComparison;
use crate::error::StrataError;
use crate::query::RequestController;
use crate::render::{LogRenderSink, RenderSink};
use crate::transport::{HttpTransport, Transport};
use crate::view::ViewportSource;

/// Serializable configuration of a [`WfsLayer`].
///
/// All fields have defaults, so a configuration file only needs to specify `url` and `layer`:
///
/// ```json
/// { "url": "https://example.com/geoserver", "layer": "topp:states", "max_features": 300 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WfsLayerOptions {
    /// Base url of the service. `/wfs` is appended to it.
    pub url: String,
    /// Feature type in the `namespace:layerName` form.
    pub layer: String,
    /// Maximum number of features requested for a viewport.
    pub max_features: u32,
    /// Whether viewport requests are limited to the visible bounding box.
    pub bbox_filter: bool,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Camera movement below this value does not trigger a refresh. `None` means any movement does.
    pub view_tolerance: Option<f64>,
    /// Skip features and geometries that cannot be decoded instead of failing the whole response.
    pub skip_recoverable_errors: bool,
}

impl Default for WfsLayerOptions {
    fn default() -> Self {
        Self {
            url: String::new(),
            layer: String::new(),
            max_features: 100,
            bbox_filter: true,
            timeout_ms: 30_000,
            view_tolerance: None,
            skip_recoverable_errors: true,
        }
    }
}

impl WfsLayerOptions {
    fn validate(&self) -> Result<(), StrataError> {
        if self.url.trim().is_empty() {
            return Err(StrataError::InvalidConfig("service url is empty".into()));
        }

        let valid_layer = self
            .layer
            .split_once(':')
            .is_some_and(|(namespace, name)| !namespace.is_empty() && !name.is_empty());
        if !valid_layer {
            return Err(StrataError::InvalidConfig(format!(
                "layer name '{}' is not in the namespace:layerName form",
                self.layer
            )));
        }

        if self.max_features == 0 {
            return Err(StrataError::InvalidConfig(
                "max_features must be positive".into(),
            ));
        }

        if let Some(tolerance) = self.view_tolerance {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(StrataError::InvalidConfig(format!(
                    "view tolerance {tolerance} is not a non-negative number"
                )));
            }
        }

        Ok(())
    }
}

/// Constructor for a [`WfsLayer`].
///
/// ```no_run
/// use strata::layer::WfsLayerBuilder;
/// # fn viewport() -> impl strata::view::ViewportSource { unimplemented!() }
///
/// let layer = WfsLayerBuilder::new("https://example.com/geoserver", "geo:rivers")
///     .with_max_features(300)
///     .build(viewport())?;
/// # Ok::<(), strata::error::StrataError>(())
/// ```
pub struct WfsLayerBuilder {
    options: WfsLayerOptions,
    transport: Option<Box<dyn Transport>>,
    sink: Option<Box<dyn RenderSink>>,
}

impl WfsLayerBuilder {
    /// Initializes a builder for the `layer` of the service at `url` with default options.
    pub fn new(url: impl Into<String>, layer: impl Into<String>) -> Self {
        Self::from_options(WfsLayerOptions {
            url: url.into(),
            layer: layer.into(),
            ..Default::default()
        })
    }

    /// Initializes a builder from a configuration.
    pub fn from_options(options: WfsLayerOptions) -> Self {
        Self {
            options,
            transport: None,
            sink: None,
        }
    }

    /// Sets the maximum number of features requested for a viewport. Defaults to 100.
    pub fn with_max_features(mut self, max_features: u32) -> Self {
        self.options.max_features = max_features;
        self
    }

    /// Enables or disables filtering viewport requests by the visible bounding box. Enabled by
    /// default.
    pub fn with_bbox_filter(mut self, enabled: bool) -> Self {
        self.options.bbox_filter = enabled;
        self
    }

    /// Sets the request timeout. Defaults to 30 seconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout_ms = timeout.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    /// Ignores camera movements up to `tolerance` in every component of the view.
    ///
    /// By default any change of the view, including floating point jitter, triggers a refresh.
    pub fn with_view_tolerance(mut self, tolerance: f64) -> Self {
        self.options.view_tolerance = Some(tolerance);
        self
    }

    /// Sets whether undecodable features are skipped (default) or fail the whole response.
    pub fn with_skip_recoverable_errors(mut self, skip: bool) -> Self {
        self.options.skip_recoverable_errors = skip;
        self
    }

    /// Sets the transport used for requests. Defaults to [`HttpTransport`].
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Sets the receiver of the loaded features. Defaults to [`LogRenderSink`].
    pub fn with_render_sink(mut self, sink: impl RenderSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Options the layer will be built with.
    pub fn options(&self) -> &WfsLayerOptions {
        &self.options
    }

    /// Validates the options and creates the layer following the given camera.
    ///
    /// # Errors
    ///
    /// * [`StrataError::InvalidConfig`] if the options are not valid.
    /// * [`StrataError::Transport`] if the default HTTP client cannot be created.
    pub fn build(self, viewport: impl ViewportSource + 'static) -> Result<WfsLayer, StrataError> {
        let Self {
            options,
            transport,
            sink,
        } = self;

        options.validate()?;

        let transport = match transport {
            Some(transport) => transport,
            None => Box::new(HttpTransport::new()?),
        };
        let sink = sink.unwrap_or_else(|| Box::new(LogRenderSink));

        let comparison = match options.view_tolerance {
            Some(tolerance) => ViewComparison::Tolerance(tolerance),
            None => ViewComparison::Exact,
        };

        let controller = RequestController::new(
            options.url,
            options.layer,
            options.max_features,
            options.bbox_filter,
        );

        Ok(WfsLayer::new(
            controller,
            comparison,
            FeatureParser::new(options.skip_recoverable_errors),
            Duration::from_millis(options.timeout_ms),
            transport,
            Box::new(viewport),
            sink,
        ))
    }
}
