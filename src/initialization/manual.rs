//! User-supplied starting position

use crate::core::{GpsCoordinate, MANUAL_STRATEGY_PRIORITY};
use crate::initialization::strategy::{InitializationResult, InitializationStrategy};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const MANUAL_STRATEGY_NAME: &str = "Manual";

/// Succeeds only when a position was set beforehand; never waits
#[derive(Debug, Default)]
pub struct ManualStrategy {
    position: Mutex<Option<GpsCoordinate>>,
}

impl ManualStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<GpsCoordinate>> {
        self.position.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_position(&self, position: GpsCoordinate) {
        *self.slot() = Some(position);
    }

    pub fn clear_position(&self) {
        *self.slot() = None;
    }

    pub fn position(&self) -> Option<GpsCoordinate> {
        *self.slot()
    }

    /// Result reported when a manual position is in place
    pub fn result_for(position: GpsCoordinate) -> InitializationResult {
        InitializationResult::succeeded(
            MANUAL_STRATEGY_NAME,
            position,
            None,
            format!(
                "Position set manually to ({}, {})",
                position.latitude(),
                position.longitude()
            ),
        )
    }
}

#[async_trait::async_trait]
impl InitializationStrategy for ManualStrategy {
    fn name(&self) -> &str {
        MANUAL_STRATEGY_NAME
    }

    fn priority(&self) -> i32 {
        MANUAL_STRATEGY_PRIORITY
    }

    async fn attempt(&self) -> InitializationResult {
        match self.position() {
            Some(position) => Self::result_for(position),
            None => InitializationResult::failed(MANUAL_STRATEGY_NAME, "Manual position not set"),
        }
    }
}
