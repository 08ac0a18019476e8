//! Detection of camera changes that require loading features again.

use serde::{Deserialize, Serialize};

use crate::view::ViewState;

/// How two camera snapshots are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum ViewComparison {
    /// Any difference counts as a change. Floating point jitter of the camera causes refreshes.
    #[default]
    Exact,
    /// Differences up to the given absolute tolerance per component are ignored.
    Tolerance(f64),
}

/// State of the [`ViewportChangeDetector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// No refresh is running.
    Idle,
    /// A change was detected and the refresh it triggered has not completed yet.
    Pending,
}

/// Decides when the visible region changed enough to load features again.
///
/// Every layer owns its detector. While a refresh is pending, further changes are not reported;
/// they are picked up by the first poll after the refresh completes because the view recorded on
/// completion is the one the refresh was started for.
#[derive(Debug, Clone)]
pub struct ViewportChangeDetector {
    comparison: ViewComparison,
    state: DetectorState,
    last_view: Option<ViewState>,
}

impl ViewportChangeDetector {
    /// Creates a detector that has not seen any view yet, so its first poll reports a change.
    pub fn new(comparison: ViewComparison) -> Self {
        Self {
            comparison,
            state: DetectorState::Idle,
            last_view: None,
        }
    }

    /// Compares two snapshots.
    pub fn has_changed(&self, current: &ViewState, last: &ViewState) -> bool {
        match self.comparison {
            ViewComparison::Exact => current != last,
            ViewComparison::Tolerance(tolerance) => !current.approx_eq(last, tolerance),
        }
    }

    /// Checks the current view. Returns true, and moves to [`DetectorState::Pending`], if a refresh
    /// should be started.
    pub fn poll(&mut self, current: &ViewState) -> bool {
        if self.state == DetectorState::Pending {
            return false;
        }

        let changed = match &self.last_view {
            Some(last) => self.has_changed(current, last),
            None => true,
        };

        if changed {
            self.state = DetectorState::Pending;
        }

        changed
    }

    /// Moves to [`DetectorState::Pending`] without checking the view, to refresh on demand.
    ///
    /// Returns false if a refresh is already pending.
    pub fn start(&mut self) -> bool {
        if self.state == DetectorState::Pending {
            return false;
        }

        self.state = DetectorState::Pending;
        true
    }

    /// Marks the pending refresh as done for `view`.
    pub fn complete(&mut self, view: ViewState) {
        self.state = DetectorState::Idle;
        self.last_view = Some(view);
    }

    /// Marks the pending refresh as failed. The last view is kept, so the next poll retries.
    pub fn fail(&mut self) {
        self.state = DetectorState::Idle;
    }

    /// Current state.
    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// View of the last completed refresh.
    pub fn last_view(&self) -> Option<&ViewState> {
        self.last_view.as_ref()
    }
}
