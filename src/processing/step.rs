//! Stride length estimation
//!
//! Weinberg model: `length = K * (max(a) - min(a))^(1/4)` over the
//! acceleration magnitudes buffered since the previous step. A manual mode
//! bypasses the model with a fixed length.

use crate::core::{PositioningError, PositioningResult};
use crate::utils::config::StepConfig;

/// Weinberg stride length for an acceleration range (m/s²)
pub fn weinberg_length(stride_coefficient: f64, accel_range: f64) -> f64 {
    if accel_range <= 0.0 {
        return 0.0;
    }
    stride_coefficient * accel_range.powf(0.25)
}

/// Stride model with "average since last query" aggregates
#[derive(Debug, Clone)]
pub struct StepLengthEstimator {
    config: StepConfig,
    step_sum: f64,
    step_count: u32,
}

impl StepLengthEstimator {
    pub fn new(config: StepConfig) -> Self {
        Self {
            config,
            step_sum: 0.0,
            step_count: 0,
        }
    }

    pub fn config(&self) -> &StepConfig {
        &self.config
    }

    pub fn set_manual_step_length(&mut self, length_m: f64) {
        self.config.manual_step_length_m = length_m;
    }

    pub fn use_manual_step_length(&mut self, use_manual: bool) {
        self.config.use_manual_step_length = use_manual;
    }

    pub fn set_stride_coefficient(&mut self, k: f64) {
        self.config.stride_coefficient = k;
    }

    /// Compute a step length from the magnitudes buffered for this step.
    ///
    /// Too few samples is an error the caller handles by dropping the step.
    /// A flat window falls back to the manual length. Accepted steps feed
    /// the running average.
    pub fn estimate(&mut self, magnitudes: &[f64]) -> PositioningResult<f64> {
        if magnitudes.len() < self.config.min_samples {
            return Err(PositioningError::InsufficientSamples {
                available: magnitudes.len(),
                required: self.config.min_samples,
            });
        }

        let length = if self.config.use_manual_step_length {
            self.config.manual_step_length_m
        } else {
            let (min, max) = magnitudes
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &m| (lo.min(m), hi.max(m)));
            let range = max - min;
            if range > 0.0 {
                weinberg_length(self.config.stride_coefficient, range)
            } else {
                self.config.manual_step_length_m
            }
        };

        self.step_sum += length;
        self.step_count += 1;
        Ok(length)
    }

    /// Average accepted step length since the previous call; resets the aggregate
    pub fn take_average_step_length(&mut self) -> f64 {
        if self.step_count == 0 {
            return 0.0;
        }
        let average = self.step_sum / self.step_count as f64;
        self.step_sum = 0.0;
        self.step_count = 0;
        average
    }

    pub fn reset(&mut self) {
        self.step_sum = 0.0;
        self.step_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_weinberg_reference_value() {
        // range 16 -> fourth root 2
        let mut estimator = StepLengthEstimator::new(StepConfig::default());
        let length = estimator.estimate(&[9.0, 25.0, 12.0, 10.0]).unwrap();
        assert!((length - 0.86).abs() < 1e-12);
    }

    #[test]
    fn test_insufficient_samples_dropped() {
        let mut estimator = StepLengthEstimator::new(StepConfig::default());
        assert_eq!(
            estimator.estimate(&[9.0, 12.0, 10.0]),
            Err(PositioningError::InsufficientSamples { available: 3, required: 4 })
        );
        assert_eq!(estimator.take_average_step_length(), 0.0);
    }

    #[test]
    fn test_flat_window_uses_manual_length() {
        let mut estimator = StepLengthEstimator::new(StepConfig::default());
        assert_eq!(estimator.estimate(&[9.8, 9.8, 9.8, 9.8]), Ok(0.75));

        estimator.set_manual_step_length(0.6);
        assert_eq!(estimator.estimate(&[9.8; 5]), Ok(0.6));
        assert!((estimator.take_average_step_length() - 0.675).abs() < 1e-12);
    }

    #[test]
    fn test_manual_length_bypasses_model() {
        let mut estimator = StepLengthEstimator::new(StepConfig::default());
        estimator.use_manual_step_length(true);
        estimator.set_manual_step_length(0.7);

        // flat window would be rejected by the model
        assert_eq!(estimator.estimate(&[9.8; 4]), Ok(0.7));
        // sample count still gates manual steps
        assert!(estimator.estimate(&[9.8]).is_err());
    }

    #[test]
    fn test_average_drains() {
        let mut estimator = StepLengthEstimator::new(StepConfig::default());
        estimator.use_manual_step_length(true);
        estimator.set_manual_step_length(0.6);
        estimator.estimate(&[1.0; 4]).unwrap();
        estimator.set_manual_step_length(0.8);
        estimator.estimate(&[1.0; 4]).unwrap();

        assert!((estimator.take_average_step_length() - 0.7).abs() < 1e-12);
        assert_eq!(estimator.take_average_step_length(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_weinberg_monotonic(k in 0.3f64..0.5, a in 0.0f64..40.0, b in 0.0f64..40.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(weinberg_length(k, lo) <= weinberg_length(k, hi));
        }
    }
}
