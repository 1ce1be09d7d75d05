//! Core types, constants and errors for the pedestrian positioning system

pub mod types;
pub mod constants;
pub mod error;

pub use types::*;
pub use constants::*;
pub use error::{PositioningError, PositioningResult};
