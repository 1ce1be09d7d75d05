use crate::core::constants::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Stride model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    /// Weinberg stride coefficient K (device/person dependent, ~0.36-0.43)
    pub stride_coefficient: f64,
    /// Steps with fewer buffered acceleration samples are dropped
    pub min_samples: usize,
    /// Bypass the Weinberg model and use `manual_step_length_m`
    pub use_manual_step_length: bool,
    /// Fixed step length (meters)
    pub manual_step_length_m: f64,
    /// Oldest magnitudes are discarded beyond this many between steps
    pub max_buffered_samples: usize,
}

/// Barometric floor estimation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevationConfig {
    /// Height of one floor (meters)
    pub floor_height_m: f64,
    /// Trailing altitude window for the floor estimate
    pub window_size: usize,
    /// Samples below this altitude are discarded (meters ASL)
    pub min_altitude_m: f64,
    /// Samples above this altitude are discarded (meters ASL)
    pub max_altitude_m: f64,
}

/// Elevator heuristic configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevatorConfig {
    /// Trailing window for both averages
    pub window_size: usize,
    /// Horizontal average must stay below this (m/s²)
    pub horizontal_epsilon: f64,
    /// Vertical average must exceed this (m/s²)
    pub vertical_threshold: f64,
}

/// GNSS initialization strategy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GnssConfig {
    /// High quality tier upper bound (meters)
    pub high_accuracy_m: f64,
    /// Good quality tier upper bound (meters)
    pub good_accuracy_m: f64,
    /// Worst accuracy accepted as a starting fix (meters)
    pub acceptable_accuracy_m: f64,
    /// Overall wait for a qualifying fix (milliseconds)
    pub timeout_ms: u64,
}

/// GNSS drift correction gating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    /// Minimum spacing between corrections (milliseconds)
    pub interval_ms: u64,
    /// Worst accuracy allowed to correct the dead-reckoned position (meters)
    pub max_accuracy_m: f64,
}

/// Full engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub step: StepConfig,
    pub elevation: ElevationConfig,
    pub elevator: ElevatorConfig,
    pub gnss: GnssConfig,
    pub drift: DriftConfig,
    /// Per-sensor arrival gap that is logged as a warning (milliseconds)
    pub large_gap_threshold_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step: StepConfig::default(),
            elevation: ElevationConfig::default(),
            elevator: ElevatorConfig::default(),
            gnss: GnssConfig::default(),
            drift: DriftConfig::default(),
            large_gap_threshold_ms: LARGE_GAP_THRESHOLD_MS,
        }
    }
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            stride_coefficient: DEFAULT_STRIDE_COEFFICIENT,
            min_samples: DEFAULT_MIN_STEP_SAMPLES,
            use_manual_step_length: false,
            manual_step_length_m: DEFAULT_MANUAL_STEP_LENGTH_M,
            max_buffered_samples: DEFAULT_MAX_BUFFERED_SAMPLES,
        }
    }
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            floor_height_m: DEFAULT_FLOOR_HEIGHT_M,
            window_size: DEFAULT_ELEVATION_WINDOW,
            min_altitude_m: MIN_VALID_ALTITUDE_M,
            max_altitude_m: MAX_VALID_ALTITUDE_M,
        }
    }
}

impl Default for ElevatorConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_ELEVATOR_WINDOW,
            horizontal_epsilon: DEFAULT_HORIZONTAL_EPSILON,
            vertical_threshold: DEFAULT_VERTICAL_THRESHOLD,
        }
    }
}

impl Default for GnssConfig {
    fn default() -> Self {
        Self {
            high_accuracy_m: GNSS_HIGH_ACCURACY_M,
            good_accuracy_m: GNSS_GOOD_ACCURACY_M,
            acceptable_accuracy_m: GNSS_ACCEPTABLE_ACCURACY_M,
            timeout_ms: GNSS_TIMEOUT_MS,
        }
    }
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            interval_ms: DRIFT_CORRECTION_INTERVAL_MS,
            max_accuracy_m: DRIFT_CORRECTION_MAX_ACCURACY_M,
        }
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Invalid parameter value
    #[error("Invalid {parameter} = {value}: {reason}")]
    InvalidParameter { parameter: String, value: String, reason: String },
    /// Configuration file I/O error
    #[error("I/O error: {message}")]
    Io { message: String },
    /// JSON serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

fn invalid(parameter: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidParameter {
        parameter: parameter.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn require_positive(parameter: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(parameter, value, "must be a positive finite number"))
    }
}

fn require_nonzero(parameter: &str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        Err(invalid(parameter, value, "must be at least 1"))
    } else {
        Ok(())
    }
}

impl EngineConfig {
    /// Check every tunable; returns the first violation found
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("step.stride_coefficient", self.step.stride_coefficient)?;
        require_positive("step.manual_step_length_m", self.step.manual_step_length_m)?;
        require_nonzero("step.min_samples", self.step.min_samples)?;
        if self.step.max_buffered_samples < self.step.min_samples {
            return Err(invalid(
                "step.max_buffered_samples",
                self.step.max_buffered_samples,
                "must be at least step.min_samples",
            ));
        }

        require_positive("elevation.floor_height_m", self.elevation.floor_height_m)?;
        require_nonzero("elevation.window_size", self.elevation.window_size)?;
        if !(self.elevation.min_altitude_m < self.elevation.max_altitude_m) {
            return Err(invalid(
                "elevation.min_altitude_m",
                self.elevation.min_altitude_m,
                "must be below elevation.max_altitude_m",
            ));
        }

        require_nonzero("elevator.window_size", self.elevator.window_size)?;
        require_positive("elevator.horizontal_epsilon", self.elevator.horizontal_epsilon)?;
        require_positive("elevator.vertical_threshold", self.elevator.vertical_threshold)?;

        require_positive("gnss.high_accuracy_m", self.gnss.high_accuracy_m)?;
        require_positive("gnss.good_accuracy_m", self.gnss.good_accuracy_m)?;
        require_positive("gnss.acceptable_accuracy_m", self.gnss.acceptable_accuracy_m)?;
        if self.gnss.high_accuracy_m > self.gnss.good_accuracy_m
            || self.gnss.good_accuracy_m > self.gnss.acceptable_accuracy_m
        {
            return Err(invalid(
                "gnss.good_accuracy_m",
                self.gnss.good_accuracy_m,
                "accuracy tiers must satisfy high <= good <= acceptable",
            ));
        }
        if self.gnss.timeout_ms == 0 {
            return Err(invalid("gnss.timeout_ms", 0, "must be at least 1"));
        }

        require_positive("drift.max_accuracy_m", self.drift.max_accuracy_m)?;

        Ok(())
    }
}

/// Owns the active configuration and its file binding
pub struct ConfigurationManager {
    config: EngineConfig,
    /// Path the configuration was loaded from or last saved to
    config_file_path: Option<String>,
    is_modified: bool,
}

impl Default for ConfigurationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationManager {
    /// Create a configuration manager with default settings
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            config_file_path: None,
            is_modified: false,
        }
    }

    /// Create configuration manager and load from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the whole configuration after validation
    pub fn update_config(&mut self, config: EngineConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        self.is_modified = true;
        Ok(())
    }

    /// Load configuration from a JSON file; missing fields take defaults
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            message: format!("Failed to read config file '{}': {}", path_str, e),
        })?;

        let config: EngineConfig = serde_json::from_str(&content).map_err(|e| ConfigError::Serialization {
            message: format!("Failed to parse config file '{}': {}", path_str, e),
        })?;

        config.validate()?;

        log::info!("Loaded engine configuration from {}", path_str);
        self.config = config;
        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = serde_json::to_string_pretty(&self.config).map_err(|e| ConfigError::Serialization {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(&path, content).map_err(|e| ConfigError::Io {
            message: format!("Failed to write config file '{}': {}", path_str, e),
        })?;

        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save to the currently bound file path
    pub fn save(&mut self) -> Result<(), ConfigError> {
        match self.config_file_path.clone() {
            Some(path) => self.save_to_file(path),
            None => Err(ConfigError::Io {
                message: "No file path set for saving configuration".to_string(),
            }),
        }
    }

    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    // Runtime parameter adjustment

    /// Set the manual step length, returning the previous value
    pub fn set_manual_step_length(&mut self, length_m: f64) -> Result<f64, ConfigError> {
        require_positive("step.manual_step_length_m", length_m)?;
        let old_value = self.config.step.manual_step_length_m;
        self.config.step.manual_step_length_m = length_m;
        self.is_modified = true;
        Ok(old_value)
    }

    pub fn set_use_manual_step_length(&mut self, use_manual: bool) {
        self.config.step.use_manual_step_length = use_manual;
        self.is_modified = true;
    }

    /// Set the floor height, returning the previous value
    pub fn set_floor_height(&mut self, height_m: f64) -> Result<f64, ConfigError> {
        require_positive("elevation.floor_height_m", height_m)?;
        let old_value = self.config.elevation.floor_height_m;
        self.config.elevation.floor_height_m = height_m;
        self.is_modified = true;
        Ok(old_value)
    }

    /// Set the Weinberg coefficient, returning the previous value
    pub fn set_stride_coefficient(&mut self, k: f64) -> Result<f64, ConfigError> {
        require_positive("step.stride_coefficient", k)?;
        let old_value = self.config.step.stride_coefficient;
        self.config.step.stride_coefficient = k;
        self.is_modified = true;
        Ok(old_value)
    }
}
