//! Barometric elevation and floor estimation
//!
//! The first three valid altitude samples fix a reference altitude (their
//! median). Relative elevation is reported against it from the fourth sample
//! on; the floor index needs a full trailing window.

use crate::core::{ElevationState, REFERENCE_ALTITUDE_SAMPLES, STANDARD_ATMOSPHERE_HPA};
use crate::processing::buffer::RingBuffer;
use crate::utils::config::ElevationConfig;

/// Altitude (meters) from static pressure (hPa), international barometric formula
pub fn barometric_altitude(pressure_hpa: f64) -> Option<f64> {
    if !pressure_hpa.is_finite() || pressure_hpa <= 0.0 {
        return None;
    }
    Some(44330.0 * (1.0 - (pressure_hpa / STANDARD_ATMOSPHERE_HPA).powf(1.0 / 5.255)))
}

/// Floor tracker fed with absolute altitude samples
#[derive(Debug, Clone)]
pub struct ElevationEstimator {
    config: ElevationConfig,
    setup_samples: Vec<f64>,
    reference_altitude: Option<f64>,
    relative_elevation: f64,
    floor_index: i32,
    window: RingBuffer,
}

impl ElevationEstimator {
    pub fn new(config: ElevationConfig) -> Self {
        let window = RingBuffer::new(config.window_size);
        Self {
            config,
            setup_samples: Vec::with_capacity(REFERENCE_ALTITUDE_SAMPLES),
            reference_altitude: None,
            relative_elevation: 0.0,
            floor_index: 0,
            window,
        }
    }

    pub fn set_floor_height(&mut self, height_m: f64) {
        self.config.floor_height_m = height_m;
    }

    /// Feed an absolute altitude (meters ASL); returns the relative elevation.
    ///
    /// Out-of-range samples are discarded and the previous value returned.
    pub fn update(&mut self, altitude_m: f64) -> f64 {
        if !altitude_m.is_finite()
            || altitude_m < self.config.min_altitude_m
            || altitude_m > self.config.max_altitude_m
        {
            log::warn!("Discarding altitude sample {:.2} m outside valid range", altitude_m);
            return self.relative_elevation;
        }

        let reference = match self.reference_altitude {
            Some(reference) => reference,
            None => {
                self.setup_samples.push(altitude_m);
                if self.setup_samples.len() == REFERENCE_ALTITUDE_SAMPLES {
                    let mut sorted = self.setup_samples.clone();
                    sorted.sort_by(f64::total_cmp);
                    let median = sorted[REFERENCE_ALTITUDE_SAMPLES / 2];
                    log::debug!("Reference altitude set to {:.2} m", median);
                    self.reference_altitude = Some(median);
                }
                return 0.0;
            }
        };

        self.relative_elevation = altitude_m - reference;

        self.window.push(altitude_m);
        if self.window.is_full() {
            if let Some(average) = self.window.mean() {
                self.floor_index = ((average - reference) / self.config.floor_height_m).round() as i32;
            }
        }

        self.relative_elevation
    }

    /// Relative elevation, 0 until the reference exists
    pub fn relative_elevation(&self) -> f64 {
        self.relative_elevation
    }

    pub fn floor_index(&self) -> i32 {
        self.floor_index
    }

    pub fn reference_altitude(&self) -> Option<f64> {
        self.reference_altitude
    }

    /// Snapshot; the elevator flag is filled in by the owner
    pub fn state(&self, in_elevator: bool) -> ElevationState {
        ElevationState {
            reference_altitude: self.reference_altitude,
            relative_elevation: self.relative_elevation,
            floor_index: self.floor_index,
            in_elevator,
        }
    }

    pub fn reset(&mut self) {
        self.setup_samples.clear();
        self.reference_altitude = None;
        self.relative_elevation = 0.0;
        self.floor_index = 0;
        self.window.clear();
    }
}
