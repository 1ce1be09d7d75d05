//! Elevator ride heuristic
//!
//! Linear acceleration is split into components along and across the gravity
//! direction. While riding an elevator the horizontal part stays near zero
//! and the vertical part carries the car's acceleration.

use crate::core::STANDARD_GRAVITY;
use crate::processing::buffer::RingBuffer;
use crate::utils::config::ElevatorConfig;
use nalgebra::Vector3;

#[derive(Debug, Clone)]
pub struct ElevatorDetector {
    config: ElevatorConfig,
    vertical: RingBuffer,
    horizontal: RingBuffer,
    in_elevator: bool,
}

impl ElevatorDetector {
    pub fn new(config: ElevatorConfig) -> Self {
        Self {
            vertical: RingBuffer::new(config.window_size),
            horizontal: RingBuffer::new(config.window_size),
            config,
            in_elevator: false,
        }
    }

    /// Feed one linear-acceleration / gravity pair (m/s²); returns the
    /// current classification.
    ///
    /// Gravity is scaled by standard gravity rather than normalized by its
    /// own magnitude, so the projection keeps the device's gravity scale.
    pub fn update(&mut self, linear_accel: [f64; 3], gravity: [f64; 3]) -> bool {
        let linear = Vector3::from(linear_accel);
        let g_unit = Vector3::from(gravity) / STANDARD_GRAVITY;

        let along = linear.dot(&g_unit);
        let horizontal = (linear - g_unit * along).norm();

        self.vertical.push(along.abs());
        self.horizontal.push(horizontal);

        if self.vertical.is_full() && self.horizontal.is_full() {
            if let (Some(h_avg), Some(v_avg)) = (self.horizontal.mean(), self.vertical.mean()) {
                let riding = h_avg < self.config.horizontal_epsilon && v_avg > self.config.vertical_threshold;
                if riding != self.in_elevator {
                    log::info!(
                        "Elevator state changed: {} (h={:.3}, v={:.3})",
                        riding,
                        h_avg,
                        v_avg
                    );
                }
                self.in_elevator = riding;
            }
        }

        self.in_elevator
    }

    pub fn in_elevator(&self) -> bool {
        self.in_elevator
    }

    pub fn reset(&mut self) {
        self.vertical.clear();
        self.horizontal.clear();
        self.in_elevator = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAVITY_DOWN: [f64; 3] = [0.0, 0.0, STANDARD_GRAVITY];

    #[test]
    fn test_needs_full_windows() {
        let mut detector = ElevatorDetector::new(ElevatorConfig::default());
        for _ in 0..99 {
            assert!(!detector.update([0.0, 0.0, 0.5], GRAVITY_DOWN));
        }
        assert!(detector.update([0.0, 0.0, 0.5], GRAVITY_DOWN));
    }

    #[test]
    fn test_walking_is_not_elevator() {
        let mut detector = ElevatorDetector::new(ElevatorConfig::default());
        for i in 0..150 {
            let sway = if i % 2 == 0 { 1.2 } else { -1.2 };
            detector.update([sway, 0.8, 0.6], GRAVITY_DOWN);
        }
        assert!(!detector.in_elevator());
    }

    #[test]
    fn test_stationary_is_not_elevator() {
        let mut detector = ElevatorDetector::new(ElevatorConfig::default());
        for _ in 0..100 {
            detector.update([0.0, 0.0, 0.0], GRAVITY_DOWN);
        }
        assert!(!detector.in_elevator());
    }

    #[test]
    fn test_classification_follows_trailing_window() {
        let mut detector = ElevatorDetector::new(ElevatorConfig::default());
        for _ in 0..100 {
            detector.update([0.0, 0.0, 0.6], GRAVITY_DOWN);
        }
        assert!(detector.in_elevator());

        for _ in 0..100 {
            detector.update([0.0, 0.0, 0.0], GRAVITY_DOWN);
        }
        assert!(!detector.in_elevator());
    }

    #[test]
    fn test_reset() {
        let mut detector = ElevatorDetector::new(ElevatorConfig::default());
        for _ in 0..100 {
            detector.update([0.0, 0.0, 0.6], GRAVITY_DOWN);
        }
        detector.reset();
        assert!(!detector.in_elevator());
        assert!(!detector.update([0.0, 0.0, 0.6], GRAVITY_DOWN));
    }
}
