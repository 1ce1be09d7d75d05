//! Pedestrian dead-reckoning tracker
//!
//! Holds the running ENU position relative to a reference point. Every
//! mutation replaces the whole [`TrackerSnapshot`] inside a watch channel, so
//! readers never see a position paired with a stale heading.

use crate::algorithms::CoordinateEngine;
use crate::core::{EnuCoordinate, GpsCoordinate, PdrState, PositioningError, PositioningResult};
use serde::Serialize;
use tokio::sync::watch;

/// Dead-reckoning state together with the reference it is relative to
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TrackerSnapshot {
    pub state: PdrState,
    pub reference: Option<GpsCoordinate>,
}

impl TrackerSnapshot {
    pub fn is_initialized(&self) -> bool {
        self.reference.is_some()
    }

    /// Position as a WGS84 coordinate
    pub fn gps(&self) -> PositioningResult<GpsCoordinate> {
        let reference = self.reference.ok_or(PositioningError::UninitializedTracker)?;
        Ok(CoordinateEngine::enu_to_gps(&self.state.position, &reference))
    }
}

#[derive(Debug)]
pub struct PdrTracker {
    snapshot: watch::Sender<TrackerSnapshot>,
}

impl Default for PdrTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PdrTracker {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(TrackerSnapshot::default());
        Self { snapshot }
    }

    /// Set the reference point and zero the position.
    ///
    /// First fix wins: returns `false` and leaves the tracker untouched when
    /// a reference already exists. Use [`PdrTracker::reanchor`] to override.
    pub fn initialize_with_gps(&self, point: GpsCoordinate) -> bool {
        let applied = self.snapshot.send_if_modified(|snapshot| {
            if snapshot.reference.is_some() {
                return false;
            }
            snapshot.reference = Some(point);
            snapshot.state.position = EnuCoordinate::default();
            true
        });

        if applied {
            log::info!(
                "PDR reference set to ({:.6}, {:.6})",
                point.latitude(),
                point.longitude()
            );
        } else {
            log::debug!("PDR already initialized, ignoring reference fix");
        }
        applied
    }

    /// Explicit manual override: replace the reference and zero the position
    pub fn reanchor(&self, point: GpsCoordinate) {
        self.snapshot.send_modify(|snapshot| {
            snapshot.reference = Some(point);
            snapshot.state.position = EnuCoordinate::default();
        });
        log::info!(
            "PDR re-anchored at ({:.6}, {:.6})",
            point.latitude(),
            point.longitude()
        );
    }

    /// Advance by one step. Heading is radians clockwise from north.
    ///
    /// Returns the new state, or `None` when no reference exists yet or the
    /// step is not finite.
    pub fn integrate_step(&self, step_length: f64, heading: f64, timestamp_ms: u64) -> Option<PdrState> {
        if !step_length.is_finite() || !heading.is_finite() {
            log::warn!("Rejecting non-finite step: {}m @ {} rad", step_length, heading);
            return None;
        }
        let mut integrated = None;
        self.snapshot.send_if_modified(|snapshot| {
            if snapshot.reference.is_none() {
                return false;
            }
            let state = &mut snapshot.state;
            state.position.east += step_length * heading.sin();
            state.position.north += step_length * heading.cos();
            state.heading = heading;
            state.last_step_length = step_length;
            state.timestamp_ms = timestamp_ms;
            state.step_count += 1;
            integrated = Some(*state);
            true
        });

        match integrated {
            Some(state) => log::debug!(
                "Step {} integrated: {:.2}m @ {:.1}° -> E {:.2} N {:.2}",
                state.step_count,
                step_length,
                heading.to_degrees(),
                state.position.east,
                state.position.north
            ),
            None => log::debug!("Step ignored, tracker not initialized"),
        }
        integrated
    }

    /// Hard reset of the position to a GNSS fix, against the existing reference
    pub fn correct_from_gps(&self, point: &GpsCoordinate, timestamp_ms: u64) -> PositioningResult<PdrState> {
        let mut corrected = Err(PositioningError::UninitializedTracker);
        self.snapshot.send_if_modified(|snapshot| {
            let Some(reference) = snapshot.reference else {
                return false;
            };
            snapshot.state.position = CoordinateEngine::gps_to_enu(point, &reference);
            snapshot.state.timestamp_ms = timestamp_ms;
            corrected = Ok(snapshot.state);
            true
        });

        if let Ok(state) = &corrected {
            log::info!(
                "Drift correction applied: E {:.2} N {:.2}",
                state.position.east,
                state.position.north
            );
        }
        corrected
    }

    pub fn current_gps(&self) -> PositioningResult<GpsCoordinate> {
        self.snapshot().gps()
    }

    pub fn current_enu(&self) -> PositioningResult<EnuCoordinate> {
        let snapshot = self.snapshot();
        if !snapshot.is_initialized() {
            return Err(PositioningError::UninitializedTracker);
        }
        Ok(snapshot.state.position)
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        *self.snapshot.borrow()
    }

    pub fn state(&self) -> PdrState {
        self.snapshot.borrow().state
    }

    pub fn reference(&self) -> Option<GpsCoordinate> {
        self.snapshot.borrow().reference
    }

    pub fn is_initialized(&self) -> bool {
        self.snapshot.borrow().is_initialized()
    }

    /// Receiver that observes every snapshot replacement
    pub fn subscribe(&self) -> watch::Receiver<TrackerSnapshot> {
        self.snapshot.subscribe()
    }

    /// Zero state and drop the reference
    pub fn reset(&self) {
        self.snapshot.send_replace(TrackerSnapshot::default());
        log::info!("PDR tracker reset");
    }
}
