//! Step and elevation estimation for one tracking session

use crate::core::{ElevationState, StepEvent};
use crate::processing::elevation::{barometric_altitude, ElevationEstimator};
use crate::processing::elevator::ElevatorDetector;
use crate::processing::step::StepLengthEstimator;
use crate::utils::config::EngineConfig;
use std::collections::VecDeque;

/// Buffers acceleration magnitudes between step triggers and turns each
/// trigger into a [`StepEvent`]; tracks floor and elevator state from
/// altitude and gravity-projected acceleration.
///
/// All operations are synchronous and bounded.
#[derive(Debug, Clone)]
pub struct StepAndElevationEstimator {
    stride: StepLengthEstimator,
    elevation: ElevationEstimator,
    elevator: ElevatorDetector,
    magnitudes: VecDeque<f64>,
    max_buffered_samples: usize,
    step_count: u32,
}

impl StepAndElevationEstimator {
    pub fn new(config: &EngineConfig) -> Self {
        let max_buffered_samples = config.step.max_buffered_samples.max(1);
        Self {
            stride: StepLengthEstimator::new(config.step.clone()),
            elevation: ElevationEstimator::new(config.elevation.clone()),
            elevator: ElevatorDetector::new(config.elevator.clone()),
            magnitudes: VecDeque::with_capacity(max_buffered_samples),
            max_buffered_samples,
            step_count: 0,
        }
    }

    /// Buffer the magnitude of an accelerometer sample (m/s²)
    pub fn add_acceleration(&mut self, x: f64, y: f64, z: f64) -> f64 {
        let magnitude = (x * x + y * y + z * z).sqrt();
        if !magnitude.is_finite() {
            log::warn!("Discarding non-finite accelerometer sample");
            return magnitude;
        }
        if self.magnitudes.len() == self.max_buffered_samples {
            self.magnitudes.pop_front();
        }
        self.magnitudes.push_back(magnitude);
        magnitude
    }

    pub fn buffered_samples(&self) -> usize {
        self.magnitudes.len()
    }

    /// Handle a step trigger with the most recent heading (radians).
    ///
    /// The magnitude buffer is consumed either way; `None` means the step
    /// was dropped.
    pub fn on_step(&mut self, heading: f64, timestamp_ms: u64) -> Option<StepEvent> {
        let window = self.magnitudes.make_contiguous();
        let estimate = self.stride.estimate(window);
        self.magnitudes.clear();

        match estimate {
            Ok(length) => {
                self.step_count += 1;
                Some(StepEvent {
                    timestamp_ms,
                    length,
                    heading,
                    step_count: self.step_count,
                })
            }
            Err(e) => {
                log::warn!("Dropping step at {}ms: {}", timestamp_ms, e);
                None
            }
        }
    }

    /// Feed an absolute altitude (meters ASL); returns relative elevation
    pub fn update_altitude(&mut self, altitude_m: f64) -> f64 {
        self.elevation.update(altitude_m)
    }

    /// Feed a barometric pressure reading (hPa)
    pub fn update_pressure(&mut self, pressure_hpa: f64) -> Option<f64> {
        match barometric_altitude(pressure_hpa) {
            Some(altitude) => Some(self.update_altitude(altitude)),
            None => {
                log::warn!("Discarding invalid pressure sample {}", pressure_hpa);
                None
            }
        }
    }

    pub fn update_elevator(&mut self, linear_accel: [f64; 3], gravity: [f64; 3]) -> bool {
        self.elevator.update(linear_accel, gravity)
    }

    pub fn elevation_state(&self) -> ElevationState {
        self.elevation.state(self.elevator.in_elevator())
    }

    pub fn floor_index(&self) -> i32 {
        self.elevation.floor_index()
    }

    pub fn in_elevator(&self) -> bool {
        self.elevator.in_elevator()
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    pub fn take_average_step_length(&mut self) -> f64 {
        self.stride.take_average_step_length()
    }

    pub fn set_manual_step_length(&mut self, length_m: f64) {
        self.stride.set_manual_step_length(length_m);
    }

    pub fn use_manual_step_length(&mut self, use_manual: bool) {
        self.stride.use_manual_step_length(use_manual);
    }

    pub fn set_stride_coefficient(&mut self, k: f64) {
        self.stride.set_stride_coefficient(k);
    }

    pub fn set_floor_height(&mut self, height_m: f64) {
        self.elevation.set_floor_height(height_m);
    }

    /// Back to cold start; configuration is kept
    pub fn reset_all(&mut self) {
        self.stride.reset();
        self.elevation.reset();
        self.elevator.reset();
        self.magnitudes.clear();
        self.step_count = 0;
    }
}
