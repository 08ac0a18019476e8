//! Camera state the layer follows, see [`ViewportSource`].

use approx::AbsDiffEq;
use nalgebra::{Matrix4, Vector3};
use serde::{Deserialize, Serialize};
use strata_types::BoundingBox;

/// Perspective frustum parameters of a camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frustum {
    /// Vertical field of view in radians.
    pub fov_y: f64,
    /// Width to height ratio of the viewport.
    pub aspect_ratio: f64,
    /// Near plane distance.
    pub near: f64,
    /// Far plane distance.
    pub far: f64,
}

impl Default for Frustum {
    fn default() -> Self {
        Self {
            fov_y: std::f64::consts::FRAC_PI_3,
            aspect_ratio: 1.0,
            near: 1.0,
            far: 5e8,
        }
    }
}

/// Snapshot of a camera: position, orientation basis, reference frame transform and frustum.
///
/// Two views are equal if every component is exactly equal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    position: Vector3<f64>,
    direction: Vector3<f64>,
    up: Vector3<f64>,
    right: Vector3<f64>,
    transform: Matrix4<f64>,
    frustum: Frustum,
}

impl ViewState {
    /// Creates a view with an identity transform and the default frustum.
    pub fn new(
        position: Vector3<f64>,
        direction: Vector3<f64>,
        up: Vector3<f64>,
        right: Vector3<f64>,
    ) -> Self {
        Self {
            position,
            direction,
            up,
            right,
            transform: Matrix4::identity(),
            frustum: Frustum::default(),
        }
    }

    /// Camera position.
    pub fn position(&self) -> Vector3<f64> {
        self.position
    }

    /// View direction.
    pub fn direction(&self) -> Vector3<f64> {
        self.direction
    }

    /// Up vector.
    pub fn up(&self) -> Vector3<f64> {
        self.up
    }

    /// Right vector.
    pub fn right(&self) -> Vector3<f64> {
        self.right
    }

    /// Reference frame transform.
    pub fn transform(&self) -> Matrix4<f64> {
        self.transform
    }

    /// Frustum parameters.
    pub fn frustum(&self) -> Frustum {
        self.frustum
    }

    /// Returns the same view moved to `position`.
    pub fn with_position(&self, position: Vector3<f64>) -> Self {
        Self { position, ..*self }
    }

    /// Returns the same view with a different reference frame transform.
    pub fn with_transform(&self, transform: Matrix4<f64>) -> Self {
        Self { transform, ..*self }
    }

    /// Returns the same view with a different frustum.
    pub fn with_frustum(&self, frustum: Frustum) -> Self {
        Self { frustum, ..*self }
    }

    /// Returns true if no component differs from the `other`'s by more than `tolerance`.
    pub fn approx_eq(&self, other: &ViewState, tolerance: f64) -> bool {
        let frustum_values = |f: &Frustum| [f.fov_y, f.aspect_ratio, f.near, f.far];

        self.position.abs_diff_eq(&other.position, tolerance)
            && self.direction.abs_diff_eq(&other.direction, tolerance)
            && self.up.abs_diff_eq(&other.up, tolerance)
            && self.right.abs_diff_eq(&other.right, tolerance)
            && self.transform.abs_diff_eq(&other.transform, tolerance)
            && frustum_values(&self.frustum)
                .iter()
                .zip(frustum_values(&other.frustum))
                .all(|(a, b)| a.abs_diff_eq(&b, tolerance))
    }
}

/// Camera the layer follows.
pub trait ViewportSource: Send + Sync {
    /// Current camera state.
    fn current_view(&self) -> ViewState;

    /// Projects the south-west and north-east screen corners onto the ellipsoid.
    ///
    /// Returns an [invalid](BoundingBox::invalid) box if a corner does not hit the ellipsoid.
    fn project_screen_corners(&self) -> BoundingBox;
}
