//! Position acquisition strategies and their results

use crate::core::{GpsCoordinate, PositioningError};
use crate::utils::config::GnssConfig;
use serde::Serialize;

/// Reporting tier for a GNSS fix. Does not influence control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FixQuality {
    High,
    Good,
    Acceptable,
}

impl FixQuality {
    /// Tier for a reported accuracy, `None` when worse than acceptable
    pub fn classify(accuracy_m: f64, config: &GnssConfig) -> Option<Self> {
        if !accuracy_m.is_finite() || accuracy_m < 0.0 {
            None
        } else if accuracy_m <= config.high_accuracy_m {
            Some(FixQuality::High)
        } else if accuracy_m <= config.good_accuracy_m {
            Some(FixQuality::Good)
        } else if accuracy_m <= config.acceptable_accuracy_m {
            Some(FixQuality::Acceptable)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FixQuality::High => "high accuracy",
            FixQuality::Good => "good",
            FixQuality::Acceptable => "acceptable",
        }
    }
}

/// Outcome of one strategy attempt, or of the whole chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitializationResult {
    success: bool,
    position: Option<GpsCoordinate>,
    accuracy_m: Option<f64>,
    strategy_used: String,
    message: String,
}

impl InitializationResult {
    pub fn succeeded(
        strategy: impl Into<String>,
        position: GpsCoordinate,
        accuracy_m: Option<f64>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            position: Some(position),
            accuracy_m,
            strategy_used: strategy.into(),
            message: message.into(),
        }
    }

    pub fn failed(strategy: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            position: None,
            accuracy_m: None,
            strategy_used: strategy.into(),
            message: message.into(),
        }
    }

    /// Failed result carrying a strategy-local error
    pub fn from_error(strategy: impl Into<String>, error: &PositioningError) -> Self {
        let strategy = strategy.into();
        let message = format!("{} initialization failed: {}", strategy, error);
        Self::failed(strategy, message)
    }

    /// Success with a usable position
    pub fn is_success(&self) -> bool {
        self.success && self.position.is_some()
    }

    pub fn position(&self) -> Option<GpsCoordinate> {
        self.position
    }

    pub fn accuracy_m(&self) -> Option<f64> {
        self.accuracy_m
    }

    pub fn strategy_used(&self) -> &str {
        &self.strategy_used
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A way of obtaining the starting position.
///
/// Lower priority values are tried first. Failures are reported through the
/// returned result; `attempt` never errors out.
#[async_trait::async_trait]
pub trait InitializationStrategy: Send + Sync {
    fn name(&self) -> &str;

    fn priority(&self) -> i32;

    async fn attempt(&self) -> InitializationResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_tiers() {
        let config = GnssConfig::default();
        assert_eq!(FixQuality::classify(3.0, &config), Some(FixQuality::High));
        assert_eq!(FixQuality::classify(5.0, &config), Some(FixQuality::High));
        assert_eq!(FixQuality::classify(8.0, &config), Some(FixQuality::Good));
        assert_eq!(FixQuality::classify(19.9, &config), Some(FixQuality::Acceptable));
        assert_eq!(FixQuality::classify(20.0, &config), Some(FixQuality::Acceptable));
        assert_eq!(FixQuality::classify(25.0, &config), None);
        assert_eq!(FixQuality::classify(f64::NAN, &config), None);
    }

    #[test]
    fn test_success_requires_position() {
        let position = GpsCoordinate::new(10.0, 20.0, 0.0).unwrap();
        let ok = InitializationResult::succeeded("GPS", position, Some(4.0), "done");
        assert!(ok.is_success());
        assert_eq!(ok.position(), Some(position));
        assert_eq!(ok.strategy_used(), "GPS");

        let failed = InitializationResult::failed("Manual", "Manual position not set");
        assert!(!failed.is_success());
        assert_eq!(failed.position(), None);
        assert_eq!(failed.accuracy_m(), None);
    }

    #[test]
    fn test_from_error_message() {
        let error = PositioningError::StrategyTimeout {
            strategy: "GPS".to_string(),
            timeout_ms: 15000,
        };
        let result = InitializationResult::from_error("GPS", &error);
        assert_eq!(result.message(), "GPS initialization failed: GPS timeout after 15000ms");
    }
}
