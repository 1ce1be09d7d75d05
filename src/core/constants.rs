//! Physical constants and system parameters

/// WGS84 semi-major axis (meters)
pub const WGS84_A: f64 = 6378137.0;

/// WGS84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257223563;

/// WGS84 semi-minor axis (meters)
pub const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);

/// WGS84 first eccentricity squared
pub const WGS84_E2: f64 = 2.0 * WGS84_F - WGS84_F * WGS84_F;

/// WGS84 second eccentricity squared
pub const WGS84_EP2: f64 = WGS84_E2 / (1.0 - WGS84_E2);

/// Mean earth radius derived from the ellipsoid, (2a + b) / 3 (meters)
pub const MEAN_EARTH_RADIUS: f64 = (2.0 * WGS84_A + WGS84_B) / 3.0;

/// Standard gravity (m/s²)
pub const STANDARD_GRAVITY: f64 = 9.80665;

/// Standard sea-level atmospheric pressure (hPa)
pub const STANDARD_ATMOSPHERE_HPA: f64 = 1013.25;

/// Weinberg stride coefficient K
pub const DEFAULT_STRIDE_COEFFICIENT: f64 = 0.43;

/// Minimum buffered acceleration samples for a usable step
pub const DEFAULT_MIN_STEP_SAMPLES: usize = 4;

/// Fixed step length used when manual step length is enabled (meters)
pub const DEFAULT_MANUAL_STEP_LENGTH_M: f64 = 0.75;

/// Upper bound on magnitudes buffered between two step triggers
pub const DEFAULT_MAX_BUFFERED_SAMPLES: usize = 512;

/// Height of one building floor (meters)
pub const DEFAULT_FLOOR_HEIGHT_M: f64 = 4.0;

/// Trailing altitude window used for floor estimation
pub const DEFAULT_ELEVATION_WINDOW: usize = 4;

/// Altitude samples needed before a reference altitude exists
pub const REFERENCE_ALTITUDE_SAMPLES: usize = 3;

/// Valid barometric altitude range (meters ASL)
pub const MIN_VALID_ALTITUDE_M: f64 = -100.0;
pub const MAX_VALID_ALTITUDE_M: f64 = 10_000.0;

/// Trailing window for the elevator heuristic
pub const DEFAULT_ELEVATOR_WINDOW: usize = 100;

/// Horizontal acceleration average below which motion counts as vertical-only (m/s²)
pub const DEFAULT_HORIZONTAL_EPSILON: f64 = 0.18;

/// Vertical acceleration average above which the cabin is moving (m/s²)
pub const DEFAULT_VERTICAL_THRESHOLD: f64 = 0.30;

/// GNSS accuracy tiers (meters)
pub const GNSS_HIGH_ACCURACY_M: f64 = 5.0;
pub const GNSS_GOOD_ACCURACY_M: f64 = 10.0;
pub const GNSS_ACCEPTABLE_ACCURACY_M: f64 = 20.0;

/// GNSS initialization timeout (milliseconds)
pub const GNSS_TIMEOUT_MS: u64 = 15_000;

/// Minimum spacing between two drift corrections (milliseconds)
pub const DRIFT_CORRECTION_INTERVAL_MS: u64 = 30_000;

/// Worst fix accuracy still allowed to correct drift (meters)
pub const DRIFT_CORRECTION_MAX_ACCURACY_M: f64 = 15.0;

/// Per-sensor gap that triggers a warning (milliseconds)
pub const LARGE_GAP_THRESHOLD_MS: u64 = 500;

/// Strategy priorities (lower is tried first)
pub const GNSS_STRATEGY_PRIORITY: i32 = 1;
pub const MANUAL_STRATEGY_PRIORITY: i32 = 10;
