//! Utility modules for configuration

pub mod config;

pub use config::{
    ConfigError, ConfigurationManager, DriftConfig, ElevationConfig, ElevatorConfig, EngineConfig,
    GnssConfig, StepConfig,
};
