//! Wait-for-accuracy GNSS strategy

use crate::core::{GnssFix, PositioningError, GNSS_STRATEGY_PRIORITY};
use crate::initialization::strategy::{FixQuality, InitializationResult, InitializationStrategy};
use crate::utils::config::GnssConfig;
use std::time::Duration;
use tokio::sync::watch;

pub const GNSS_STRATEGY_NAME: &str = "GPS";

/// Waits for a fix at or below the acceptable accuracy, bounded by a timeout.
/// The latest fix already in the channel counts.
#[derive(Debug, Clone)]
pub struct GnssStrategy {
    fixes: watch::Receiver<Option<GnssFix>>,
    config: GnssConfig,
}

impl GnssStrategy {
    pub fn new(fixes: watch::Receiver<Option<GnssFix>>, config: GnssConfig) -> Self {
        Self { fixes, config }
    }

    async fn wait_for_fix(&self) -> Result<GnssFix, PositioningError> {
        let mut fixes = self.fixes.clone();
        let threshold = self.config.acceptable_accuracy_m;
        let timeout = Duration::from_millis(self.config.timeout_ms);

        let waited = tokio::time::timeout(
            timeout,
            fixes.wait_for(|fix| fix.map_or(false, |f| f.meets_accuracy(threshold))),
        )
        .await
        .map(|received| received.map(|fix| *fix));

        match waited {
            Ok(Ok(Some(fix))) => Ok(fix),
            Ok(Ok(None)) | Ok(Err(_)) => Err(PositioningError::SourceClosed {
                source_name: "gnss".to_string(),
            }),
            Err(_) => Err(PositioningError::StrategyTimeout {
                strategy: GNSS_STRATEGY_NAME.to_string(),
                timeout_ms: self.config.timeout_ms,
            }),
        }
    }
}

#[async_trait::async_trait]
impl InitializationStrategy for GnssStrategy {
    fn name(&self) -> &str {
        GNSS_STRATEGY_NAME
    }

    fn priority(&self) -> i32 {
        GNSS_STRATEGY_PRIORITY
    }

    async fn attempt(&self) -> InitializationResult {
        match self.wait_for_fix().await {
            Ok(fix) => {
                let tier = FixQuality::classify(fix.accuracy_m, &self.config)
                    .unwrap_or(FixQuality::Acceptable);
                InitializationResult::succeeded(
                    GNSS_STRATEGY_NAME,
                    fix.coordinate,
                    Some(fix.accuracy_m),
                    format!(
                        "GPS initialized with {}m accuracy ({})",
                        fix.accuracy_m,
                        tier.label()
                    ),
                )
            }
            Err(e) => {
                log::warn!("GNSS strategy failed: {}", e);
                InitializationResult::from_error(GNSS_STRATEGY_NAME, &e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GpsCoordinate;

    fn fix(accuracy_m: f64) -> GnssFix {
        GnssFix::new(GpsCoordinate::new(51.5007, -0.1246, 0.0).unwrap(), accuracy_m, 0)
    }

    #[tokio::test(start_paused = true)]
    async fn test_current_fix_counts() {
        let (_tx, rx) = watch::channel(Some(fix(8.0)));
        let result = GnssStrategy::new(rx, GnssConfig::default()).attempt().await;
        assert!(result.is_success());
        assert_eq!(result.accuracy_m(), Some(8.0));
        assert_eq!(result.message(), "GPS initialized with 8m accuracy (good)");
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_past_poor_fixes() {
        let (tx, rx) = watch::channel(Some(fix(40.0)));
        let strategy = GnssStrategy::new(rx, GnssConfig::default());

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            tx.send_replace(Some(fix(30.0)));
            tokio::time::sleep(Duration::from_secs(2)).await;
            tx.send_replace(Some(fix(4.5)));
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        let result = strategy.attempt().await;
        assert!(result.is_success());
        assert_eq!(result.accuracy_m(), Some(4.5));
        assert!(result.message().ends_with("(high accuracy)"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fails_without_low_confidence_fix() {
        let (_tx, rx) = watch::channel(Some(fix(35.0)));
        let start = tokio::time::Instant::now();
        let result = GnssStrategy::new(rx, GnssConfig::default()).attempt().await;

        assert!(!result.is_success());
        assert_eq!(result.position(), None);
        assert_eq!(result.strategy_used(), "GPS");
        assert_eq!(result.message(), "GPS initialization failed: GPS timeout after 15000ms");
        assert!(start.elapsed() >= Duration::from_millis(15_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_source_fails_fast() {
        let (tx, rx) = watch::channel(None);
        drop(tx);
        let result = GnssStrategy::new(rx, GnssConfig::default()).attempt().await;
        assert!(!result.is_success());
        assert!(result.message().contains("Source closed"));
    }
}
