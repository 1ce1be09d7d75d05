//! Device attitude from a rotation-vector sensor

use nalgebra::{Matrix3, Quaternion, UnitQuaternion};
use serde::Serialize;
use std::f64::consts::TAU;

const MIN_QUATERNION_NORM: f64 = 1e-6;

/// Azimuth, pitch and roll in radians. Azimuth is measured clockwise from
/// north and lies in `[0, 2π)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Orientation {
    pub azimuth: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl Orientation {
    /// Build from rotation-vector components `(x, y, z[, w])`.
    ///
    /// A missing scalar part is recovered from the unit-norm constraint.
    /// Returns `None` for non-finite components or a near-zero quaternion.
    pub fn from_rotation_vector(x: f64, y: f64, z: f64, w: Option<f64>) -> Option<Self> {
        let w = w.unwrap_or_else(|| (1.0 - x * x - y * y - z * z).max(0.0).sqrt());
        let quaternion = Quaternion::new(w, x, y, z);
        if !quaternion.coords.iter().all(|c| c.is_finite()) {
            return None;
        }
        let rotation = UnitQuaternion::try_new(quaternion, MIN_QUATERNION_NORM)?;
        Some(Self::from_rotation_matrix(rotation.to_rotation_matrix().matrix()))
    }

    /// Device-to-world rotation matrix (world axes: east, north, up)
    pub fn from_rotation_matrix(r: &Matrix3<f64>) -> Self {
        let azimuth = r[(0, 1)].atan2(r[(1, 1)]).rem_euclid(TAU);
        let pitch = (-r[(2, 1)]).clamp(-1.0, 1.0).asin();
        let roll = (-r[(2, 0)]).atan2(r[(2, 2)]);
        Self { azimuth, pitch, roll }
    }
}
