//! Gating for GNSS drift corrections

use crate::core::GnssFix;
use crate::utils::config::DriftConfig;

/// Outcome of presenting a fix to the policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriftDecision {
    /// Correct the tracker from this fix
    Apply,
    /// No correction window yet (tracker not seeded)
    NotArmed,
    /// Reported accuracy worse than the gate
    RejectedAccuracy { accuracy_m: f64 },
    /// Interval since the last correction has not elapsed
    TooSoon { remaining_ms: u64 },
}

/// At most one correction per interval, and only from accurate fixes.
///
/// The interval is measured from the last applied correction, or from the
/// arming time when none has been applied yet.
#[derive(Debug, Clone)]
pub struct DriftCorrectionPolicy {
    config: DriftConfig,
    last_correction_ms: Option<u64>,
}

impl DriftCorrectionPolicy {
    pub fn new(config: DriftConfig) -> Self {
        Self {
            config,
            last_correction_ms: None,
        }
    }

    /// Start the interval clock at `timestamp_ms`
    pub fn arm(&mut self, timestamp_ms: u64) {
        self.last_correction_ms = Some(timestamp_ms);
    }

    pub fn is_armed(&self) -> bool {
        self.last_correction_ms.is_some()
    }

    pub fn last_correction_ms(&self) -> Option<u64> {
        self.last_correction_ms
    }

    /// Decide on a fix; an `Apply` decision restarts the interval
    pub fn evaluate(&mut self, fix: &GnssFix) -> DriftDecision {
        let Some(last) = self.last_correction_ms else {
            return DriftDecision::NotArmed;
        };

        if !fix.meets_accuracy(self.config.max_accuracy_m) {
            return DriftDecision::RejectedAccuracy {
                accuracy_m: fix.accuracy_m,
            };
        }

        let elapsed = fix.timestamp_ms.saturating_sub(last);
        if elapsed < self.config.interval_ms {
            return DriftDecision::TooSoon {
                remaining_ms: self.config.interval_ms - elapsed,
            };
        }

        self.last_correction_ms = Some(fix.timestamp_ms);
        DriftDecision::Apply
    }

    pub fn reset(&mut self) {
        self.last_correction_ms = None;
    }
}
