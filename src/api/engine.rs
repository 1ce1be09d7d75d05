//! Positioning engine: routes samples to the estimator, tracker and
//! initialization controller, and republishes the best estimate.
//!
//! Samples can be pushed synchronously from sensor callbacks with
//! [`PositioningEngine::handle_sample`] or queued through an
//! [`EngineHandle`] that feeds a single consumer task. Either way, samples of
//! one stream are processed in arrival order, and a step uses the latest
//! heading seen before it.

use crate::api::callback::{CallbackHandle, CallbackRegistry, EngineEvent, EventCallback};
use crate::api::outputs::EngineOutputs;
use crate::api::samples::{AxisSample, SensorKind, SensorSample};
use crate::core::{ElevationState, GnssFix, GpsCoordinate, PositioningError, PositioningResult};
use crate::initialization::{
    GnssStrategy, InitializationController, InitializationOutcome, InitializationResult,
    InitializationStatus, ManualStrategy,
};
use crate::processing::{Orientation, StepAndElevationEstimator};
use crate::tracking::{DriftCorrectionPolicy, DriftDecision, PdrTracker};
use crate::utils::config::{ConfigError, ConfigurationManager, EngineConfig};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Mutable per-session state behind the sample path
struct FusionState {
    config: ConfigurationManager,
    estimator: StepAndElevationEstimator,
    drift: DriftCorrectionPolicy,
    heading: f64,
    gravity: Option<[f64; 3]>,
    linear_acceleration: Option<[f64; 3]>,
    gyroscope: Option<AxisSample>,
    magnetometer: Option<AxisSample>,
    last_timestamps: HashMap<SensorKind, u64>,
    latest_timestamp_ms: u64,
    samples_processed: u64,
}

impl FusionState {
    fn new(config: ConfigurationManager) -> Self {
        let estimator = StepAndElevationEstimator::new(config.config());
        let drift = DriftCorrectionPolicy::new(config.config().drift.clone());
        Self {
            config,
            estimator,
            drift,
            heading: 0.0,
            gravity: None,
            linear_acceleration: None,
            gyroscope: None,
            magnetometer: None,
            last_timestamps: HashMap::new(),
            latest_timestamp_ms: 0,
            samples_processed: 0,
        }
    }
}

pub struct PositioningEngine {
    tracker: Arc<PdrTracker>,
    controller: InitializationController,
    manual: Arc<ManualStrategy>,
    outputs: EngineOutputs,
    callbacks: Mutex<CallbackRegistry>,
    state: Mutex<FusionState>,
}

impl PositioningEngine {
    /// Engine with the GNSS and manual strategies, after validating `config`
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        let mut manager = ConfigurationManager::new();
        manager.update_config(config)?;
        Ok(Self::with_manager(manager))
    }

    /// Engine driven by an already validated configuration manager
    pub fn with_manager(manager: ConfigurationManager) -> Self {
        let outputs = EngineOutputs::new();
        let tracker = Arc::new(PdrTracker::new());
        let manual = Arc::new(ManualStrategy::new());
        let gnss = GnssStrategy::new(outputs.subscribe_observed_gnss(), manager.config().gnss.clone());

        let controller = InitializationController::new(Arc::clone(&tracker))
            .with_strategy(Arc::new(gnss))
            .with_manual_strategy(Arc::clone(&manual));

        Self {
            tracker,
            controller,
            manual,
            outputs,
            callbacks: Mutex::new(CallbackRegistry::new()),
            state: Mutex::new(FusionState::new(manager)),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, FusionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_callbacks(&self) -> MutexGuard<'_, CallbackRegistry> {
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Process one sample and return the events it produced.
    ///
    /// Synchronous and bounded; safe to call from any thread.
    pub fn handle_sample(&self, sample: SensorSample) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        {
            let mut state = self.lock_state();
            self.process(&mut state, sample, &mut events);
        }
        self.dispatch(&events);
        events
    }

    fn process(&self, state: &mut FusionState, sample: SensorSample, events: &mut Vec<EngineEvent>) {
        let kind = sample.kind();
        let timestamp_ms = sample.timestamp_ms();
        self.check_gap(state, kind, timestamp_ms, events);
        state.latest_timestamp_ms = state.latest_timestamp_ms.max(timestamp_ms);
        state.samples_processed += 1;

        match sample {
            SensorSample::Accelerometer(s) => {
                state.estimator.add_acceleration(s.x, s.y, s.z);
            }
            SensorSample::Gyroscope(s) => state.gyroscope = Some(s),
            SensorSample::Magnetometer(s) => state.magnetometer = Some(s),
            SensorSample::RotationVector { x, y, z, w, .. } => match Orientation::from_rotation_vector(x, y, z, w) {
                Some(orientation) => {
                    state.heading = orientation.azimuth;
                    self.outputs.publish_orientation(orientation);
                }
                None => log::warn!("Discarding degenerate rotation vector at {}ms", timestamp_ms),
            },
            SensorSample::Gravity(s) => {
                let gravity = s.vector();
                state.gravity = Some(gravity);
                if let Some(linear) = state.linear_acceleration {
                    state.estimator.update_elevator(linear, gravity);
                    self.publish_elevation(state, events);
                }
            }
            SensorSample::LinearAcceleration(s) => state.linear_acceleration = Some(s.vector()),
            SensorSample::Pressure { hpa, .. } => {
                if state.estimator.update_pressure(hpa).is_some() {
                    self.publish_elevation(state, events);
                }
            }
            SensorSample::Step { timestamp_ms } => self.handle_step(state, timestamp_ms, events),
            SensorSample::Gnss {
                latitude,
                longitude,
                altitude,
                accuracy_m,
                timestamp_ms,
            } => self.handle_gnss(state, latitude, longitude, altitude, accuracy_m, timestamp_ms, events),
        }
    }

    fn check_gap(&self, state: &mut FusionState, kind: SensorKind, timestamp_ms: u64, events: &mut Vec<EngineEvent>) {
        let previous = state.last_timestamps.insert(kind, timestamp_ms);
        if !kind.is_periodic() {
            return;
        }
        let threshold = state.config.config().large_gap_threshold_ms;
        if let Some(previous) = previous {
            let gap_ms = timestamp_ms.saturating_sub(previous);
            if gap_ms > threshold {
                log::warn!("Large time gap for sensor {}: {} ms", kind.name(), gap_ms);
                events.push(EngineEvent::LargeGap {
                    stream: kind.name(),
                    gap_ms,
                });
            }
        }
    }

    fn handle_step(&self, state: &mut FusionState, timestamp_ms: u64, events: &mut Vec<EngineEvent>) {
        let Some(step) = state.estimator.on_step(state.heading, timestamp_ms) else {
            events.push(EngineEvent::StepDropped { timestamp_ms });
            return;
        };

        self.outputs.publish_step(step);
        events.push(EngineEvent::StepDetected(step));

        if self.tracker.integrate_step(step.length, step.heading, timestamp_ms).is_some() {
            self.publish_position(timestamp_ms, events);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_gnss(
        &self,
        state: &mut FusionState,
        latitude: f64,
        longitude: f64,
        altitude: f64,
        accuracy_m: f64,
        timestamp_ms: u64,
        events: &mut Vec<EngineEvent>,
    ) {
        let coordinate = match GpsCoordinate::new(latitude, longitude, altitude) {
            Ok(coordinate) => coordinate,
            Err(e) => {
                log::warn!("Discarding GNSS fix: {}", e);
                return;
            }
        };
        if !accuracy_m.is_finite() || accuracy_m < 0.0 {
            log::warn!("Discarding GNSS fix with accuracy {}", accuracy_m);
            return;
        }

        let fix = GnssFix::new(coordinate, accuracy_m, timestamp_ms);
        self.outputs.publish_observed_gnss(fix);

        if !self.tracker.is_initialized() {
            return;
        }
        if !state.drift.is_armed() {
            state.drift.arm(timestamp_ms);
            return;
        }

        match state.drift.evaluate(&fix) {
            DriftDecision::Apply => {
                if self.tracker.correct_from_gps(&coordinate, timestamp_ms).is_ok() {
                    events.push(EngineEvent::DriftCorrected {
                        position: coordinate,
                        accuracy_m,
                        timestamp_ms,
                    });
                    self.publish_position(timestamp_ms, events);
                }
            }
            decision => log::debug!("GNSS fix not used for drift correction: {:?}", decision),
        }
    }

    fn publish_position(&self, timestamp_ms: u64, events: &mut Vec<EngineEvent>) {
        if let Ok(position) = self.tracker.current_gps() {
            self.outputs.publish_position(Some(position));
            events.push(EngineEvent::PositionUpdated { position, timestamp_ms });
        }
    }

    fn publish_elevation(&self, state: &FusionState, events: &mut Vec<EngineEvent>) {
        let current = state.estimator.elevation_state();
        let previous = self.outputs.publish_elevation(current);

        if previous.floor_index != current.floor_index {
            log::info!("Floor changed: {} -> {}", previous.floor_index, current.floor_index);
            events.push(EngineEvent::FloorChanged {
                old_floor: previous.floor_index,
                new_floor: current.floor_index,
            });
        }
        if previous.in_elevator != current.in_elevator {
            events.push(EngineEvent::ElevatorChanged {
                in_elevator: current.in_elevator,
            });
        }
    }

    fn dispatch(&self, events: &[EngineEvent]) {
        if events.is_empty() {
            return;
        }
        let callbacks = self.lock_callbacks().snapshot();
        for event in events {
            for callback in &callbacks {
                callback(event);
            }
        }
    }

    /// Seeded tracker: start the drift interval and publish the position
    fn on_seeded(&self) {
        let mut events = Vec::new();
        {
            let mut state = self.lock_state();
            let timestamp_ms = state.latest_timestamp_ms;
            state.drift.arm(timestamp_ms);
            self.publish_position(timestamp_ms, &mut events);
        }
        self.dispatch(&events);
    }

    /// Run the initialization chain (GNSS, then manual)
    pub async fn initialize(&self) -> InitializationOutcome {
        let outcome = self.controller.initialize().await;
        match &outcome {
            InitializationOutcome::Completed(result) if result.is_success() => self.on_seeded(),
            InitializationOutcome::AlreadyRunning => return outcome,
            _ => {}
        }
        self.dispatch(&[EngineEvent::InitializationChanged(self.controller.status())]);
        outcome
    }

    pub fn cancel_initialization(&self) -> bool {
        self.controller.cancel()
    }

    /// Use a user-chosen start position and re-anchor the tracker on it
    pub fn set_manual_starting_position(
        &self,
        latitude: f64,
        longitude: f64,
        altitude: f64,
    ) -> PositioningResult<InitializationResult> {
        let result = self
            .controller
            .set_manual_starting_position(latitude, longitude, altitude)?;
        self.on_seeded();
        self.dispatch(&[EngineEvent::InitializationChanged(self.controller.status())]);
        Ok(result)
    }

    pub fn initialization_status(&self) -> InitializationStatus {
        self.controller.status()
    }

    pub fn subscribe_initialization(&self) -> watch::Receiver<InitializationStatus> {
        self.controller.subscribe_status()
    }

    pub fn status_message(&self) -> &'static str {
        self.controller.status_message()
    }

    pub fn needs_initialization(&self) -> bool {
        self.controller.needs_initialization()
    }

    pub fn current_gps(&self) -> PositioningResult<GpsCoordinate> {
        self.tracker.current_gps()
    }

    pub fn tracker(&self) -> &PdrTracker {
        &self.tracker
    }

    pub fn outputs(&self) -> &EngineOutputs {
        &self.outputs
    }

    pub fn elevation_state(&self) -> ElevationState {
        self.lock_state().estimator.elevation_state()
    }

    /// Heading used for the next step (radians clockwise from north)
    pub fn heading(&self) -> f64 {
        self.lock_state().heading
    }

    pub fn latest_gyroscope(&self) -> Option<AxisSample> {
        self.lock_state().gyroscope
    }

    pub fn latest_magnetometer(&self) -> Option<AxisSample> {
        self.lock_state().magnetometer
    }

    pub fn latest_gravity(&self) -> Option<[f64; 3]> {
        self.lock_state().gravity
    }

    pub fn samples_processed(&self) -> u64 {
        self.lock_state().samples_processed
    }

    /// Average accepted step length since the previous call
    pub fn take_average_step_length(&self) -> f64 {
        self.lock_state().estimator.take_average_step_length()
    }

    pub fn config(&self) -> EngineConfig {
        self.lock_state().config.config().clone()
    }

    pub fn set_manual_step_length(&self, length_m: f64) -> Result<(), ConfigError> {
        let mut state = self.lock_state();
        state.config.set_manual_step_length(length_m)?;
        state.estimator.set_manual_step_length(length_m);
        Ok(())
    }

    pub fn use_manual_step_length(&self, use_manual: bool) {
        let mut state = self.lock_state();
        state.config.set_use_manual_step_length(use_manual);
        state.estimator.use_manual_step_length(use_manual);
    }

    pub fn set_floor_height(&self, height_m: f64) -> Result<(), ConfigError> {
        let mut state = self.lock_state();
        state.config.set_floor_height(height_m)?;
        state.estimator.set_floor_height(height_m);
        Ok(())
    }

    pub fn set_stride_coefficient(&self, k: f64) -> Result<(), ConfigError> {
        let mut state = self.lock_state();
        state.config.set_stride_coefficient(k)?;
        state.estimator.set_stride_coefficient(k);
        Ok(())
    }

    pub fn register_callback(&self, callback: EventCallback) -> CallbackHandle {
        self.lock_callbacks().register(callback)
    }

    pub fn unregister_callback(&self, handle: CallbackHandle) -> bool {
        self.lock_callbacks().unregister(handle)
    }

    /// Start a new session: cancels initialization, drops the reference and
    /// returns every estimator to cold start. Configuration is kept.
    pub fn reset(&self) {
        self.controller.reset();
        self.manual.clear_position();
        self.tracker.reset();
        {
            let mut state = self.lock_state();
            let config = state.config.config().clone();
            state.estimator = StepAndElevationEstimator::new(&config);
            state.drift = DriftCorrectionPolicy::new(config.drift);
            state.heading = 0.0;
            state.gravity = None;
            state.linear_acceleration = None;
            state.gyroscope = None;
            state.magnetometer = None;
            state.last_timestamps.clear();
            state.latest_timestamp_ms = 0;
        }
        self.outputs.clear();
        log::info!("Positioning engine reset");
    }

    /// Consume samples from `samples` until every sender is dropped.
    /// Returns the number of samples handled.
    pub async fn run(&self, mut samples: mpsc::Receiver<SensorSample>) -> u64 {
        let mut handled = 0;
        while let Some(sample) = samples.recv().await {
            self.handle_sample(sample);
            handled += 1;
        }
        log::debug!("Sample loop finished after {} samples", handled);
        handled
    }

    /// Spawn the single-consumer loop on the current runtime
    pub fn spawn_loop(self: &Arc<Self>, capacity: usize) -> (EngineHandle, JoinHandle<u64>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let engine = Arc::clone(self);
        let task = tokio::spawn(async move { engine.run(rx).await });
        (EngineHandle { samples: tx }, task)
    }
}

/// Producer side of the engine's sample queue
#[derive(Debug, Clone)]
pub struct EngineHandle {
    samples: mpsc::Sender<SensorSample>,
}

impl EngineHandle {
    pub fn new(samples: mpsc::Sender<SensorSample>) -> Self {
        Self { samples }
    }

    /// Queue a sample, waiting for room
    pub async fn send(&self, sample: SensorSample) -> PositioningResult<()> {
        self.samples.send(sample).await.map_err(|_| closed())
    }

    /// Queue a sample without waiting; a full queue drops the sample
    pub fn try_send(&self, sample: SensorSample) -> PositioningResult<bool> {
        match self.samples.try_send(sample) {
            Ok(()) => Ok(true),
            Err(mpsc::error::TrySendError::Full(_)) => {
                log::warn!("Sample queue full, dropping {} sample", sample.kind().name());
                Ok(false)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(closed()),
        }
    }
}

fn closed() -> PositioningError {
    PositioningError::SourceClosed {
        source_name: "engine sample loop".to_string(),
    }
}
