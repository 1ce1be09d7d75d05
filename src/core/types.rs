//! Core data types for the positioning system

use crate::core::error::{PositioningError, PositioningResult};
use serde::{Deserialize, Serialize};

/// WGS84 geodetic position. Latitude and longitude are validated on
/// construction; out-of-range values are rejected, never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGpsCoordinate")]
pub struct GpsCoordinate {
    latitude: f64,
    longitude: f64,
    altitude: f64,
}

#[derive(Deserialize)]
struct RawGpsCoordinate {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    altitude: f64,
}

impl TryFrom<RawGpsCoordinate> for GpsCoordinate {
    type Error = PositioningError;

    fn try_from(raw: RawGpsCoordinate) -> Result<Self, Self::Error> {
        GpsCoordinate::new(raw.latitude, raw.longitude, raw.altitude)
    }
}

impl GpsCoordinate {
    /// Create a validated coordinate (degrees, degrees, meters)
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> PositioningResult<Self> {
        if !Self::is_valid_wgs84(latitude, longitude) || !altitude.is_finite() {
            return Err(PositioningError::InvalidCoordinate { latitude, longitude });
        }
        Ok(Self { latitude, longitude, altitude })
    }

    /// Build from values produced by the coordinate engine itself.
    /// atan2-derived latitude/longitude are within bounds by construction.
    pub(crate) fn from_engine(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self { latitude, longitude, altitude }
    }

    pub fn is_valid_wgs84(latitude: f64, longitude: f64) -> bool {
        latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude)
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn altitude(&self) -> f64 {
        self.altitude
    }
}

/// Local East-North-Up offset (meters). Only meaningful together with the
/// reference `GpsCoordinate` that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnuCoordinate {
    pub east: f64,
    pub north: f64,
    pub up: f64,
}

impl EnuCoordinate {
    pub fn new(east: f64, north: f64, up: f64) -> Self {
        Self { east, north, up }
    }

    /// Horizontal distance from the origin (meters)
    pub fn horizontal_norm(&self) -> f64 {
        self.east.hypot(self.north)
    }
}

/// Earth-Centered Earth-Fixed position (meters)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EcefCoordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Dead-reckoning state, replaced as a whole on every mutation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PdrState {
    /// Position relative to the reference point
    pub position: EnuCoordinate,
    /// Heading of the last step (radians, 0 = north, clockwise)
    pub heading: f64,
    /// Length of the last integrated step (meters)
    pub last_step_length: f64,
    /// Timestamp of the last update (milliseconds)
    pub timestamp_ms: u64,
    /// Steps integrated since the tracker was seeded
    pub step_count: u32,
}

/// Barometric elevation and floor state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ElevationState {
    /// Median of the first three valid altitude samples (meters ASL)
    pub reference_altitude: Option<f64>,
    /// Latest altitude minus the reference (meters)
    pub relative_elevation: f64,
    /// Estimated floor relative to the starting floor
    pub floor_index: i32,
    /// Elevator heuristic output
    pub in_elevator: bool,
}

/// A step accepted by the stride model
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepEvent {
    pub timestamp_ms: u64,
    /// Stride length (meters)
    pub length: f64,
    /// Heading at the step (radians)
    pub heading: f64,
    /// Running step count for the session
    pub step_count: u32,
}

/// GNSS fix with its reported horizontal accuracy
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GnssFix {
    pub coordinate: GpsCoordinate,
    /// Reported accuracy radius (meters)
    pub accuracy_m: f64,
    pub timestamp_ms: u64,
}

impl GnssFix {
    pub fn new(coordinate: GpsCoordinate, accuracy_m: f64, timestamp_ms: u64) -> Self {
        Self { coordinate, accuracy_m, timestamp_ms }
    }

    /// Whether the fix is at least as accurate as `max_accuracy_m`
    pub fn meets_accuracy(&self, max_accuracy_m: f64) -> bool {
        self.accuracy_m.is_finite() && self.accuracy_m <= max_accuracy_m
    }
}
