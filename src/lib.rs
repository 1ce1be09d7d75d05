//! Pedestrian Positioning Core
//!
//! Pedestrian dead reckoning anchored on GNSS: step events advance a local
//! East-North-Up position around a reference fix, barometric altitude gives
//! the floor, and accurate GNSS fixes periodically reset accumulated drift.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod tracking;
pub mod initialization;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use self::core::{
    EcefCoordinate, ElevationState, EnuCoordinate, GnssFix, GpsCoordinate, PdrState,
    PositioningError, PositioningResult, StepEvent,
};
pub use algorithms::CoordinateEngine;
pub use processing::{Orientation, StepAndElevationEstimator};
pub use tracking::{DriftCorrectionPolicy, DriftDecision, PdrTracker, TrackerSnapshot};
pub use initialization::{
    FixQuality, GnssStrategy, InitializationController, InitializationOutcome, InitializationResult,
    InitializationStatus, InitializationStrategy, ManualStrategy,
};
pub use utils::{ConfigError, ConfigurationManager, EngineConfig};
pub use api::{
    AxisSample, CallbackHandle, EngineEvent, EngineHandle, EngineOutputs, PositioningEngine,
    SensorKind, SensorSample,
};
