//! Error taxonomy for the positioning core

use thiserror::Error;

/// Result type for positioning operations
pub type PositioningResult<T> = Result<T, PositioningError>;

/// Positioning errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PositioningError {
    /// Latitude or longitude outside WGS84 bounds
    #[error("Invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// Too few acceleration samples buffered for a stride estimate
    #[error("Insufficient samples: {available} buffered, {required} required")]
    InsufficientSamples { available: usize, required: usize },

    /// No reference point has been set yet
    #[error("Tracker not initialized: no reference point")]
    UninitializedTracker,

    /// Strategy gave up waiting
    #[error("{strategy} timeout after {timeout_ms}ms")]
    StrategyTimeout { strategy: String, timeout_ms: u64 },

    /// Strategy failed for another reason
    #[error("{strategy} failed: {reason}")]
    StrategyFailure { strategy: String, reason: String },

    /// An input channel was closed by its producer
    #[error("Source closed: {source_name}")]
    SourceClosed { source_name: String },
}
