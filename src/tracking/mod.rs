//! Dead-reckoning state and GNSS drift correction

pub mod drift;
pub mod tracker;

pub use drift::{DriftCorrectionPolicy, DriftDecision};
pub use tracker::{PdrTracker, TrackerSnapshot};
