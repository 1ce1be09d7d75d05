//! Sensor processing: stride model, elevation, elevator and orientation

pub mod buffer;
pub mod elevation;
pub mod elevator;
pub mod estimator;
pub mod orientation;
pub mod step;

pub use buffer::RingBuffer;
pub use elevation::{barometric_altitude, ElevationEstimator};
pub use elevator::ElevatorDetector;
pub use estimator::StepAndElevationEstimator;
pub use orientation::Orientation;
pub use step::{weinberg_length, StepLengthEstimator};
