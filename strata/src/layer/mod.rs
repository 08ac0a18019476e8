//! [`WfsLayer`] keeps the features of a WFS feature type loaded for the visible region.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use parking_lot::Mutex;
use strata_gml::{FeatureParser, FeatureRecord, XmlElement};
use tokio_util::sync::CancellationToken;

use crate::change_detector::{DetectorState, ViewComparison, ViewportChangeDetector};
use crate::dedup::FeatureDeduplicator;
use crate::error::StrataError;
use crate::query::RequestController;
use crate::render::RenderSink;
use crate::transport::Transport;
use crate::view::{ViewState, ViewportSource};

mod builder;

pub use builder::{WfsLayerBuilder, WfsLayerOptions};

/// Result of a single refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The viewport could not be projected onto the ellipsoid, so no request was made.
    Skipped,
    /// The response was parsed and the new features were handed to the render sink.
    Applied {
        /// Number of features presented for the first time.
        admitted: usize,
        /// Number of features that were already loaded.
        duplicates: usize,
        /// Number of features and geometries skipped because of decoding errors.
        skipped: usize,
    },
    /// The layer was shut down before the response arrived. Nothing was changed.
    Discarded,
    /// Another refresh is running. Nothing was requested.
    InProgress,
}

/// Layer loading features of one WFS feature type as the camera moves.
///
/// The application calls [`WfsLayer::tick`] once per frame. When the camera has moved since the
/// last load, the layer requests the features in the visible bounding box in a background task.
/// Features that were not loaded before are handed to the [`RenderSink`] and kept in the layer.
/// Only one viewport request runs at a time.
///
/// Dropping the layer, or calling [`WfsLayer::shutdown`], cancels the running request. Its
/// response is never applied.
///
/// Use [`WfsLayerBuilder`] to create a layer.
pub struct WfsLayer {
    inner: Arc<LayerInner>,
}

struct LayerInner {
    state: Mutex<LayerState>,
    parser: FeatureParser,
    timeout: Duration,
    transport: Box<dyn Transport>,
    viewport: Box<dyn ViewportSource>,
    sink: Box<dyn RenderSink>,
    shutdown: CancellationToken,
}

struct LayerState {
    controller: RequestController,
    detector: ViewportChangeDetector,
    deduplicator: FeatureDeduplicator,
    features: Vec<Arc<FeatureRecord>>,
}

struct Batch {
    admitted: Vec<Arc<FeatureRecord>>,
    duplicates: usize,
    skipped: usize,
}

impl WfsLayer {
    pub(crate) fn new(
        controller: RequestController,
        comparison: ViewComparison,
        parser: FeatureParser,
        timeout: Duration,
        transport: Box<dyn Transport>,
        viewport: Box<dyn ViewportSource>,
        sink: Box<dyn RenderSink>,
    ) -> Self {
        Self {
            inner: Arc::new(LayerInner {
                state: Mutex::new(LayerState {
                    controller,
                    detector: ViewportChangeDetector::new(comparison),
                    deduplicator: FeatureDeduplicator::new(),
                    features: vec![],
                }),
                parser,
                timeout,
                transport,
                viewport,
                sink,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Checks the camera and starts loading features in background if it has moved.
    ///
    /// Returns true if a refresh was started. Outside of a tokio runtime no refresh can be started,
    /// and the camera change is picked up by the first tick inside one.
    pub fn tick(&self) -> bool {
        if self.inner.shutdown.is_cancelled() {
            return false;
        }

        let view = self.inner.viewport.current_view();
        if !self.inner.state.lock().detector.poll(&view) {
            return false;
        }

        let inner = self.inner.clone();
        let spawned = crate::async_runtime::spawn(async move {
            if let Ok(outcome) = inner.refresh_view(view).await {
                debug!("Refresh of layer {} finished: {outcome:?}", inner.layer());
            }
        });

        if let Err(err) = spawned {
            warn!("Failed to refresh layer {}: {err}", self.inner.layer());
            self.inner.state.lock().detector.fail();
            return false;
        }

        true
    }

    /// Loads the features of the current viewport and waits for the result, whether the camera has
    /// moved or not.
    ///
    /// Errors are returned as well as logged. The layer stays usable after an error.
    pub async fn refresh(&self) -> Result<RefreshOutcome, StrataError> {
        if self.inner.shutdown.is_cancelled() {
            return Ok(RefreshOutcome::Discarded);
        }

        let view = self.inner.viewport.current_view();
        if !self.inner.state.lock().detector.start() {
            return Ok(RefreshOutcome::InProgress);
        }

        self.inner.refresh_view(view).await
    }

    /// Requests the service capabilities document.
    pub async fn get_capabilities(&self) -> Result<String, StrataError> {
        let url = self.inner.state.lock().controller.capabilities_url();
        let text = self.inner.fetch(&url).await?.ok_or(StrataError::Cancelled)?;
        debug!("Capabilities of {url}: {text}");
        Ok(text)
    }

    /// Requests the schema of the layer's feature type.
    pub async fn describe_feature_type(&self) -> Result<String, StrataError> {
        let url = self.inner.state.lock().controller.describe_url();
        let text = self.inner.fetch(&url).await?.ok_or(StrataError::Cancelled)?;
        debug!("Feature type description of {url}: {text}");
        Ok(text)
    }

    /// Loads the features with the given ids, regardless of the viewport.
    ///
    /// Returns the features that were not loaded before. They are presented and stored the same way
    /// as the viewport features.
    pub async fn get_features<S: AsRef<str>>(
        &self,
        ids: &[S],
    ) -> Result<Vec<Arc<FeatureRecord>>, StrataError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let url = self.inner.state.lock().controller.features_by_ids_url(ids);
        let batch = self.inner.load(&url).await?.ok_or(StrataError::Cancelled)?;
        Ok(batch.admitted)
    }

    /// Loads a single feature. Returns `None` if the feature was already loaded or the service did
    /// not return it.
    pub async fn get_feature(&self, id: &str) -> Result<Option<Arc<FeatureRecord>>, StrataError> {
        Ok(self.get_features(&[id]).await?.into_iter().next())
    }

    /// Number of loaded features.
    pub fn feature_count(&self) -> usize {
        self.inner.state.lock().features.len()
    }

    /// Loaded features in the order they were admitted.
    pub fn features(&self) -> Vec<Arc<FeatureRecord>> {
        self.inner.state.lock().features.clone()
    }

    /// Maximum number of features requested for a viewport.
    pub fn max_features(&self) -> u32 {
        self.inner.state.lock().controller.max_features()
    }

    /// Changes the maximum number of features requested for a viewport. Applies from the next
    /// request on.
    pub fn set_max_features(&self, max_features: u32) {
        self.inner
            .state
            .lock()
            .controller
            .set_max_features(max_features);
    }

    /// Returns true while a viewport refresh is running.
    pub fn is_loading(&self) -> bool {
        self.inner.state.lock().detector.state() == DetectorState::Pending
    }

    /// Cancels running requests and stops the layer from making new ones.
    pub fn shutdown(&self) {
        if !self.inner.shutdown.is_cancelled() {
            info!("Shutting down layer {}", self.inner.layer());
            self.inner.shutdown.cancel();
        }
    }
}

impl std::fmt::Debug for WfsLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("WfsLayer")
            .field("url", &state.controller.base_url())
            .field("layer", &state.controller.layer())
            .field("features", &state.features.len())
            .finish_non_exhaustive()
    }
}

impl Drop for WfsLayer {
    fn drop(&mut self) {
        self.inner.shutdown.cancel();
    }
}

impl LayerInner {
    fn layer(&self) -> String {
        self.state.lock().controller.layer().to_string()
    }

    /// Runs a refresh the detector has already been moved to the pending state for.
    async fn refresh_view(&self, view: ViewState) -> Result<RefreshOutcome, StrataError> {
        let result = self.load_viewport().await;

        let mut state = self.state.lock();
        match &result {
            Ok(RefreshOutcome::Discarded) => state.detector.fail(),
            Ok(_) => state.detector.complete(view),
            Err(err) => {
                warn!(
                    "Failed to load features of layer {}: {err}",
                    state.controller.layer()
                );
                state.detector.fail();
            }
        }

        result
    }

    async fn load_viewport(&self) -> Result<RefreshOutcome, StrataError> {
        let bbox = self.viewport.project_screen_corners();
        let url = self.state.lock().controller.features_url(&bbox);
        let url = match url {
            Ok(url) => url,
            Err(StrataError::InvalidViewportProjection) => {
                debug!("Viewport does not intersect the ellipsoid, skipping request");
                return Ok(RefreshOutcome::Skipped);
            }
            Err(err) => return Err(err),
        };

        Ok(match self.load(&url).await? {
            Some(batch) => RefreshOutcome::Applied {
                admitted: batch.admitted.len(),
                duplicates: batch.duplicates,
                skipped: batch.skipped,
            },
            None => RefreshOutcome::Discarded,
        })
    }

    /// Fetches and applies a feature collection. Returns `None` if the layer was shut down.
    async fn load(&self, url: &str) -> Result<Option<Batch>, StrataError> {
        match self.fetch(url).await? {
            Some(text) => self.apply(&text),
            None => Ok(None),
        }
    }

    async fn fetch(&self, url: &str) -> Result<Option<String>, StrataError> {
        if self.shutdown.is_cancelled() {
            return Ok(None);
        }

        info!("Requesting {url}");
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                debug!("Request to {url} cancelled");
                Ok(None)
            }
            result = tokio::time::timeout(self.timeout, self.transport.fetch_text(url)) => {
                match result {
                    Ok(text) => text.map(Some),
                    Err(_) => Err(StrataError::Timeout(self.timeout)),
                }
            }
        }
    }

    /// Parses the response and admits its new features.
    ///
    /// The state lock is only held for single dedup lookups and for admitting the batch, so ticks
    /// are not blocked by parsing or rendering. Admission is atomic: either all new features of the
    /// response are stored or none.
    fn apply(&self, text: &str) -> Result<Option<Batch>, StrataError> {
        let document = XmlElement::parse(text)?;
        let collection = self
            .parser
            .parse(&document, |id| !self.state.lock().deduplicator.contains(id))?;
        drop(document);

        let mut duplicates = collection.duplicates;
        let admitted = {
            let mut state = self.state.lock();
            if self.shutdown.is_cancelled() {
                return Ok(None);
            }

            let mut admitted = Vec::with_capacity(collection.features.len());
            for record in collection.features {
                if !state.deduplicator.admit(&record.id) {
                    duplicates += 1;
                    continue;
                }

                let record = Arc::new(record);
                state.features.push(record.clone());
                admitted.push(record);
            }

            admitted
        };

        for record in &admitted {
            self.sink.present(&record.geometries, &record.properties);
        }

        debug!(
            "Admitted {} features, {duplicates} duplicates, {} skipped",
            admitted.len(),
            collection.skipped.len()
        );

        Ok(Some(Batch {
            admitted,
            duplicates,
            skipped: collection.skipped.len(),
        }))
    }
}
