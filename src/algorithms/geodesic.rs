//! Geodesic distance and bearing between WGS84 positions

use crate::core::{GpsCoordinate, MEAN_EARTH_RADIUS, WGS84_A, WGS84_B, WGS84_F};

/// Convergence threshold on the longitude difference on the auxiliary sphere
const VINCENTY_TOLERANCE: f64 = 1e-12;

/// Iteration cap before falling back to haversine
const VINCENTY_MAX_ITERATIONS: usize = 100;

/// Ellipsoidal distance in meters (Vincenty inverse).
///
/// Near-antipodal pairs that fail to converge fall back to haversine on the
/// mean earth radius; the fallback is silent.
pub fn distance(p1: &GpsCoordinate, p2: &GpsCoordinate) -> f64 {
    match vincenty_distance(p1, p2) {
        Some(meters) => meters,
        None => {
            log::debug!(
                "Vincenty did not converge for ({}, {}) -> ({}, {}), using haversine",
                p1.latitude(), p1.longitude(), p2.latitude(), p2.longitude()
            );
            haversine_distance(p1, p2)
        }
    }
}

/// Vincenty inverse formula; `None` when the iteration does not converge
pub fn vincenty_distance(p1: &GpsCoordinate, p2: &GpsCoordinate) -> Option<f64> {
    let l = (p2.longitude() - p1.longitude()).to_radians();
    let u1 = ((1.0 - WGS84_F) * p1.latitude().to_radians().tan()).atan();
    let u2 = ((1.0 - WGS84_F) * p2.latitude().to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    for _ in 0..VINCENTY_MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();

        if sin_sigma == 0.0 {
            // Coincident points
            return Some(0.0);
        }

        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;

        // Both points on the equator
        let cos_2sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
            0.0
        };

        let c = WGS84_F / 16.0 * cos_sq_alpha * (4.0 + WGS84_F * (4.0 - 3.0 * cos_sq_alpha));
        let lambda_prev = lambda;
        lambda = l
            + (1.0 - c)
                * WGS84_F
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

        if (lambda - lambda_prev).abs() < VINCENTY_TOLERANCE {
            let u_sq = cos_sq_alpha * (WGS84_A * WGS84_A - WGS84_B * WGS84_B) / (WGS84_B * WGS84_B);
            let a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
            let b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
            let delta_sigma = b
                * sin_sigma
                * (cos_2sigma_m
                    + b / 4.0
                        * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                            - b / 6.0
                                * cos_2sigma_m
                                * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                                * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));

            return Some(WGS84_B * a * (sigma - delta_sigma));
        }
    }

    None
}

/// Great-circle distance on a sphere of mean earth radius (meters)
pub fn haversine_distance(p1: &GpsCoordinate, p2: &GpsCoordinate) -> f64 {
    let lat1 = p1.latitude().to_radians();
    let lat2 = p2.latitude().to_radians();
    let delta_lat = (p2.latitude() - p1.latitude()).to_radians();
    let delta_lon = (p2.longitude() - p1.longitude()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    MEAN_EARTH_RADIUS * c
}

/// Initial forward azimuth from `p1` to `p2`, degrees in [0, 360)
pub fn bearing(p1: &GpsCoordinate, p2: &GpsCoordinate) -> f64 {
    let lat1 = p1.latitude().to_radians();
    let lat2 = p2.latitude().to_radians();
    let delta_lon = (p2.longitude() - p1.longitude()).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if bearing >= 360.0 {
        0.0
    } else {
        bearing
    }
}
