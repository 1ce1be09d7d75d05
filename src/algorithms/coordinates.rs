//! Geodetic coordinate transformations on the WGS84 ellipsoid
//!
//! Conversions between:
//! - Geodetic coordinates (latitude, longitude, altitude)
//! - ECEF (Earth-Centered, Earth-Fixed) coordinates
//! - ENU (East-North-Up) coordinates in the tangent plane of a reference point
//!
//! Everything here is pure and stateless, safe to call from any thread.

use crate::core::{
    EcefCoordinate, EnuCoordinate, GpsCoordinate, WGS84_A, WGS84_B, WGS84_E2, WGS84_EP2,
};
use nalgebra::{Matrix3, Vector3};

/// Stateless WGS84 transform engine
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateEngine;

impl CoordinateEngine {
    /// Geodetic (degrees, degrees, meters) to ECEF, closed form
    pub fn geodetic_to_ecef(latitude: f64, longitude: f64, altitude: f64) -> EcefCoordinate {
        let (sin_lat, cos_lat) = latitude.to_radians().sin_cos();
        let (sin_lon, cos_lon) = longitude.to_radians().sin_cos();

        // Radius of curvature in the prime vertical
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();

        EcefCoordinate {
            x: (n + altitude) * cos_lat * cos_lon,
            y: (n + altitude) * cos_lat * sin_lon,
            z: (n * (1.0 - WGS84_E2) + altitude) * sin_lat,
        }
    }

    /// ECEF to geodetic using Bowring's closed-form approximation.
    ///
    /// No iterative refinement; sub-millimeter for points near the ellipsoid.
    /// Height uses the form that stays finite at the poles instead of `p / cos(lat) - N`.
    pub fn ecef_to_geodetic(ecef: &EcefCoordinate) -> GpsCoordinate {
        let p = ecef.x.hypot(ecef.y);
        let theta = (ecef.z * WGS84_A).atan2(p * WGS84_B);
        let (sin_theta, cos_theta) = theta.sin_cos();

        let longitude = ecef.y.atan2(ecef.x);
        let latitude = (ecef.z + WGS84_EP2 * WGS84_B * sin_theta.powi(3))
            .atan2(p - WGS84_E2 * WGS84_A * cos_theta.powi(3));

        let (sin_lat, cos_lat) = latitude.sin_cos();
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        let altitude = p * cos_lat + (ecef.z + WGS84_E2 * n * sin_lat) * sin_lat - n;

        GpsCoordinate::from_engine(latitude.to_degrees(), longitude.to_degrees(), altitude)
    }

    /// Convert `point` into the ENU frame anchored at `reference`
    pub fn gps_to_enu(point: &GpsCoordinate, reference: &GpsCoordinate) -> EnuCoordinate {
        let delta = Self::ecef_vector(point) - Self::ecef_vector(reference);
        let enu = Self::ecef_to_enu_rotation(reference) * delta;
        EnuCoordinate::new(enu.x, enu.y, enu.z)
    }

    /// Inverse of [`CoordinateEngine::gps_to_enu`] for the same reference
    pub fn enu_to_gps(enu: &EnuCoordinate, reference: &GpsCoordinate) -> GpsCoordinate {
        // Rotation is orthonormal, so the transpose is the inverse
        let delta = Self::ecef_to_enu_rotation(reference).transpose()
            * Vector3::new(enu.east, enu.north, enu.up);
        let ecef = Self::ecef_vector(reference) + delta;

        Self::ecef_to_geodetic(&EcefCoordinate { x: ecef.x, y: ecef.y, z: ecef.z })
    }

    fn ecef_vector(point: &GpsCoordinate) -> Vector3<f64> {
        let ecef = Self::geodetic_to_ecef(point.latitude(), point.longitude(), point.altitude());
        Vector3::new(ecef.x, ecef.y, ecef.z)
    }

    /// Rows are the east, north and up unit vectors of the reference tangent plane
    fn ecef_to_enu_rotation(reference: &GpsCoordinate) -> Matrix3<f64> {
        let (sin_lat, cos_lat) = reference.latitude().to_radians().sin_cos();
        let (sin_lon, cos_lon) = reference.longitude().to_radians().sin_cos();

        Matrix3::new(
            -sin_lon, cos_lon, 0.0,
            -sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat,
            cos_lat * cos_lon, cos_lat * sin_lon, sin_lat,
        )
    }
}
