//! Geodetic algorithms: coordinate transforms and geodesics

pub mod coordinates;
pub mod geodesic;

pub use coordinates::CoordinateEngine;
pub use geodesic::{bearing, distance, haversine_distance, vincenty_distance};
