//! Tracking of the features a layer has already loaded.

use std::collections::HashSet;

use strata_gml::FeatureId;

/// Set of features already handed to the renderer.
///
/// Features are identified by the integer part of their id, so `contour.1` and `lake.1` are
/// considered the same feature. The set only grows for the lifetime of the layer.
#[derive(Debug, Default, Clone)]
pub struct FeatureDeduplicator {
    seen: HashSet<u64>,
}

impl FeatureDeduplicator {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the feature. Returns true if it was not seen before.
    pub fn admit(&mut self, id: &FeatureId) -> bool {
        self.seen.insert(id.key())
    }

    /// Returns true if the feature was already admitted.
    pub fn contains(&self, id: &FeatureId) -> bool {
        self.seen.contains(&id.key())
    }

    /// Number of admitted features.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns true if nothing was admitted yet.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
