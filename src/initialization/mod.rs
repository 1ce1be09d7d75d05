//! Starting-position acquisition

pub mod controller;
pub mod gnss;
pub mod manual;
pub mod strategy;

pub use controller::{InitializationController, InitializationOutcome, InitializationStatus};
pub use gnss::GnssStrategy;
pub use manual::ManualStrategy;
pub use strategy::{FixQuality, InitializationResult, InitializationStrategy};
