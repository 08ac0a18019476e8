//! Error types used by the crate.

use std::time::Duration;

use strata_gml::GmlError;
use thiserror::Error;

/// Strata error type.
#[derive(Debug, Error)]
pub enum StrataError {
    /// Network request failed or the server answered with an error status.
    #[error("failed to load data: {0}")]
    Transport(String),
    /// The server did not answer in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// The viewport does not intersect the ellipsoid, so no bounding box can be computed.
    #[error("viewport cannot be projected onto the ellipsoid")]
    InvalidViewportProjection,
    /// Error decoding the response document.
    #[error("failed to decode data: {0}")]
    Decoding(#[from] GmlError),
    /// Layer options are not valid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The layer was shut down before the operation completed.
    #[error("layer is shut down")]
    Cancelled,
    /// Generic error - details are inside.
    #[error("{0}")]
    Generic(String),
}

impl From<reqwest::Error> for StrataError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}
