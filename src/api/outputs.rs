//! Outbound last-value-wins channels
//!
//! Each output is a watch channel: readers take a snapshot or await the next
//! replacement, without blocking the sample path.

use crate::core::{ElevationState, GnssFix, GpsCoordinate, StepEvent};
use crate::processing::Orientation;
use tokio::sync::watch;

#[derive(Debug)]
pub struct EngineOutputs {
    position: watch::Sender<Option<GpsCoordinate>>,
    observed_gnss: watch::Sender<Option<GnssFix>>,
    elevation: watch::Sender<ElevationState>,
    last_step: watch::Sender<Option<StepEvent>>,
    orientation: watch::Sender<Option<Orientation>>,
}

impl Default for EngineOutputs {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineOutputs {
    pub fn new() -> Self {
        Self {
            position: watch::channel(None).0,
            observed_gnss: watch::channel(None).0,
            elevation: watch::channel(ElevationState::default()).0,
            last_step: watch::channel(None).0,
            orientation: watch::channel(None).0,
        }
    }

    pub(crate) fn publish_position(&self, position: Option<GpsCoordinate>) {
        self.position.send_replace(position);
    }

    pub(crate) fn publish_observed_gnss(&self, fix: GnssFix) {
        self.observed_gnss.send_replace(Some(fix));
    }

    /// Publishes only when something changed; returns the previous state
    pub(crate) fn publish_elevation(&self, state: ElevationState) -> ElevationState {
        let mut previous = state;
        self.elevation.send_if_modified(|current| {
            previous = *current;
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
        previous
    }

    pub(crate) fn publish_step(&self, step: StepEvent) {
        self.last_step.send_replace(Some(step));
    }

    pub(crate) fn publish_orientation(&self, orientation: Orientation) {
        self.orientation.send_replace(Some(orientation));
    }

    pub(crate) fn clear(&self) {
        self.position.send_replace(None);
        self.observed_gnss.send_replace(None);
        self.elevation.send_replace(ElevationState::default());
        self.last_step.send_replace(None);
        self.orientation.send_replace(None);
    }

    /// Best-estimate position; `None` until the tracker is seeded
    pub fn position(&self) -> Option<GpsCoordinate> {
        *self.position.borrow()
    }

    /// Latest valid GNSS fix, whether or not it corrected the tracker
    pub fn observed_gnss(&self) -> Option<GnssFix> {
        *self.observed_gnss.borrow()
    }

    pub fn elevation(&self) -> ElevationState {
        *self.elevation.borrow()
    }

    pub fn floor_index(&self) -> i32 {
        self.elevation.borrow().floor_index
    }

    pub fn in_elevator(&self) -> bool {
        self.elevation.borrow().in_elevator
    }

    pub fn relative_elevation(&self) -> f64 {
        self.elevation.borrow().relative_elevation
    }

    pub fn last_step(&self) -> Option<StepEvent> {
        *self.last_step.borrow()
    }

    pub fn orientation(&self) -> Option<Orientation> {
        *self.orientation.borrow()
    }

    pub fn subscribe_position(&self) -> watch::Receiver<Option<GpsCoordinate>> {
        self.position.subscribe()
    }

    pub fn subscribe_observed_gnss(&self) -> watch::Receiver<Option<GnssFix>> {
        self.observed_gnss.subscribe()
    }

    pub fn subscribe_elevation(&self) -> watch::Receiver<ElevationState> {
        self.elevation.subscribe()
    }

    pub fn subscribe_steps(&self) -> watch::Receiver<Option<StepEvent>> {
        self.last_step.subscribe()
    }
}
