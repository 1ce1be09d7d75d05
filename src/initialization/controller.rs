//! Initialization state machine
//!
//! `Idle -> Running -> {Succeeded, Failed}`. Strategies are tried in priority
//! order; the first success seeds the tracker. `cancel()`, or dropping the
//! `initialize()` future, aborts the chain and returns to `Idle` without
//! touching the tracker.

use crate::core::{GpsCoordinate, PositioningResult};
use crate::initialization::manual::ManualStrategy;
use crate::initialization::strategy::{InitializationResult, InitializationStrategy};
use crate::tracking::PdrTracker;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{oneshot, watch};

pub const STATUS_SEARCHING: &str = "Searching for your location...";
pub const STATUS_READY: &str = "PDR ready and tracking your position.";
pub const STATUS_NOT_INITIALIZED: &str = "PDR not initialized. Please start initialization.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum InitializationStatus {
    Idle,
    Running,
    Succeeded(InitializationResult),
    Failed(InitializationResult),
}

impl InitializationStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, InitializationStatus::Running)
    }

    pub fn result(&self) -> Option<&InitializationResult> {
        match self {
            InitializationStatus::Succeeded(result) | InitializationStatus::Failed(result) => Some(result),
            _ => None,
        }
    }
}

/// What a call to [`InitializationController::initialize`] ended with
#[derive(Debug, Clone, PartialEq)]
pub enum InitializationOutcome {
    /// The chain ran to the end; the result may be a success or a failure
    Completed(InitializationResult),
    Cancelled,
    /// Another attempt was already in flight; nothing was done
    AlreadyRunning,
}

struct ActiveAttempt {
    generation: u64,
    cancel: oneshot::Sender<()>,
}

#[derive(Default)]
struct AttemptSlot {
    generation: u64,
    active: Option<ActiveAttempt>,
}

impl AttemptSlot {
    fn start(&mut self) -> (u64, oneshot::Receiver<()>) {
        self.generation += 1;
        let (cancel, cancelled) = oneshot::channel();
        self.active = Some(ActiveAttempt {
            generation: self.generation,
            cancel,
        });
        (self.generation, cancelled)
    }

    /// Take the active attempt only if it is `generation`
    fn take_if(&mut self, generation: u64) -> Option<ActiveAttempt> {
        if self.active.as_ref().is_some_and(|a| a.generation == generation) {
            self.active.take()
        } else {
            None
        }
    }
}

/// Returns the controller to `Idle` when an attempt's future is dropped
/// before it finishes
struct AttemptGuard<'a> {
    controller: &'a InitializationController,
    generation: u64,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self.controller.attempt_slot();
        if slot.take_if(self.generation).is_some() {
            log::warn!("Initialization attempt dropped before completion");
            self.controller.status.send_replace(InitializationStatus::Idle);
        }
    }
}

pub struct InitializationController {
    strategies: Vec<Arc<dyn InitializationStrategy>>,
    manual: Option<Arc<ManualStrategy>>,
    tracker: Arc<PdrTracker>,
    status: watch::Sender<InitializationStatus>,
    // Guards both the running flag transition and the cancel signal
    attempt: Mutex<AttemptSlot>,
}

impl InitializationController {
    pub fn new(tracker: Arc<PdrTracker>) -> Self {
        let (status, _) = watch::channel(InitializationStatus::Idle);
        Self {
            strategies: Vec::new(),
            manual: None,
            tracker,
            status,
            attempt: Mutex::new(AttemptSlot::default()),
        }
    }

    /// Add a strategy; the set stays sorted by ascending priority
    pub fn with_strategy(mut self, strategy: Arc<dyn InitializationStrategy>) -> Self {
        self.strategies.push(strategy);
        self.strategies.sort_by_key(|s| s.priority());
        self
    }

    /// Add the manual strategy and keep a handle for
    /// [`InitializationController::set_manual_starting_position`]
    pub fn with_manual_strategy(mut self, manual: Arc<ManualStrategy>) -> Self {
        self.manual = Some(Arc::clone(&manual));
        self.with_strategy(manual)
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    fn attempt_slot(&self) -> MutexGuard<'_, AttemptSlot> {
        self.attempt.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run the strategy chain once.
    ///
    /// A call while another attempt is running returns
    /// [`InitializationOutcome::AlreadyRunning`] and has no effect.
    pub async fn initialize(&self) -> InitializationOutcome {
        let (generation, cancelled) = {
            let mut slot = self.attempt_slot();
            let started = self.status.send_if_modified(|status| {
                if status.is_running() {
                    return false;
                }
                *status = InitializationStatus::Running;
                true
            });
            if !started {
                log::warn!("Initialization already in progress");
                return InitializationOutcome::AlreadyRunning;
            }
            slot.start()
        };
        let _guard = AttemptGuard {
            controller: self,
            generation,
        };

        log::debug!("Starting initialization with {} strategies", self.strategies.len());

        let result = tokio::select! {
            biased;
            _ = cancelled => {
                log::warn!("Initialization cancelled");
                return InitializationOutcome::Cancelled;
            }
            result = self.run_chain() => result,
        };

        // A cancel that landed after the chain finished still wins
        let mut slot = self.attempt_slot();
        if slot.take_if(generation).is_none() {
            log::warn!("Initialization cancelled");
            return InitializationOutcome::Cancelled;
        }

        if result.is_success() {
            if let Some(position) = result.position() {
                self.tracker.initialize_with_gps(position);
            }
            log::info!(
                "PDR initialized successfully using {}: {}",
                result.strategy_used(),
                result.message()
            );
            self.status
                .send_replace(InitializationStatus::Succeeded(result.clone()));
        } else {
            log::warn!("PDR initialization failed: {}", result.message());
            self.status.send_replace(InitializationStatus::Failed(result.clone()));
        }
        drop(slot);

        InitializationOutcome::Completed(result)
    }

    async fn run_chain(&self) -> InitializationResult {
        for strategy in &self.strategies {
            let result = strategy.attempt().await;
            if result.is_success() {
                return result;
            }
            log::warn!("{} strategy failed: {}", strategy.name(), result.message());
        }
        InitializationResult::failed("None", "All initialization strategies failed")
    }

    /// Abort an in-flight attempt and return to `Idle`. Safe from any thread;
    /// returns whether anything was cancelled.
    pub fn cancel(&self) -> bool {
        let mut slot = self.attempt_slot();
        match slot.active.take() {
            Some(attempt) => {
                // the receiver may already be gone if the chain just ended
                let _ = attempt.cancel.send(());
                self.status.send_replace(InitializationStatus::Idle);
                true
            }
            None => false,
        }
    }

    /// Validate and apply a user-chosen start position.
    ///
    /// Cancels any running attempt, stores the position for the manual
    /// strategy and re-anchors the tracker.
    pub fn set_manual_starting_position(
        &self,
        latitude: f64,
        longitude: f64,
        altitude: f64,
    ) -> PositioningResult<InitializationResult> {
        let position = GpsCoordinate::new(latitude, longitude, altitude)?;
        self.cancel();

        if let Some(manual) = &self.manual {
            manual.set_position(position);
        }
        self.tracker.reanchor(position);

        let result = ManualStrategy::result_for(position);
        log::info!("Manual position set: {}", result.message());
        self.status
            .send_replace(InitializationStatus::Succeeded(result.clone()));
        Ok(result)
    }

    pub fn status(&self) -> InitializationStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<InitializationStatus> {
        self.status.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.status.borrow().is_running()
    }

    pub fn needs_initialization(&self) -> bool {
        !self.tracker.is_initialized()
    }

    pub fn status_message(&self) -> &'static str {
        if self.is_running() {
            STATUS_SEARCHING
        } else if self.needs_initialization() {
            STATUS_NOT_INITIALIZED
        } else {
            STATUS_READY
        }
    }

    /// Cancel anything in flight and forget the last outcome
    pub fn reset(&self) {
        self.cancel();
        self.status.send_replace(InitializationStatus::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GnssFix;
    use crate::initialization::gnss::GnssStrategy;
    use crate::utils::config::GnssConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FixedStrategy {
        name: &'static str,
        priority: i32,
        position: Option<GpsCoordinate>,
        calls: AtomicUsize,
    }

    impl FixedStrategy {
        fn new(name: &'static str, priority: i32, position: Option<GpsCoordinate>) -> Arc<Self> {
            Arc::new(Self {
                name,
                priority,
                position,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl InitializationStrategy for FixedStrategy {
        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        async fn attempt(&self) -> InitializationResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.position {
                Some(p) => InitializationResult::succeeded(self.name, p, Some(3.0), "ok"),
                None => InitializationResult::failed(self.name, format!("{} unavailable", self.name)),
            }
        }
    }

    fn coordinate(lat: f64, lon: f64) -> GpsCoordinate {
        GpsCoordinate::new(lat, lon, 0.0).unwrap()
    }

    fn gnss_controller() -> (Arc<InitializationController>, watch::Sender<Option<GnssFix>>, Arc<PdrTracker>) {
        let tracker = Arc::new(PdrTracker::new());
        let (fixes, rx) = watch::channel(None);
        let controller = InitializationController::new(Arc::clone(&tracker))
            .with_strategy(Arc::new(GnssStrategy::new(rx, GnssConfig::default())))
            .with_manual_strategy(Arc::new(ManualStrategy::new()));
        (Arc::new(controller), fixes, tracker)
    }

    #[tokio::test(start_paused = true)]
    async fn test_priority_order_and_fallthrough() {
        let tracker = Arc::new(PdrTracker::new());
        let b = FixedStrategy::new("B", 2, Some(coordinate(1.0, 2.0)));
        let a = FixedStrategy::new("A", 1, None);
        let c = FixedStrategy::new("C", 3, Some(coordinate(5.0, 6.0)));
        let controller = InitializationController::new(Arc::clone(&tracker))
            .with_strategy(b.clone())
            .with_strategy(c.clone())
            .with_strategy(a.clone());
        assert_eq!(controller.strategy_names(), vec!["A", "B", "C"]);

        let outcome = controller.initialize().await;
        let InitializationOutcome::Completed(result) = outcome else {
            panic!("expected completion");
        };
        assert!(result.is_success());
        assert_eq!(result.strategy_used(), "B");
        assert_eq!(result.message(), "ok");
        assert_eq!(a.calls.load(Ordering::SeqCst), 1);
        assert_eq!(c.calls.load(Ordering::SeqCst), 0);

        assert_eq!(tracker.reference(), Some(coordinate(1.0, 2.0)));
        assert!(matches!(controller.status(), InitializationStatus::Succeeded(_)));
        assert_eq!(controller.status_message(), STATUS_READY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_strategies_fail() {
        let tracker = Arc::new(PdrTracker::new());
        let controller = InitializationController::new(Arc::clone(&tracker))
            .with_strategy(FixedStrategy::new("A", 1, None))
            .with_strategy(FixedStrategy::new("B", 2, None));

        let outcome = controller.initialize().await;
        let expected = InitializationResult::failed("None", "All initialization strategies failed");
        assert_eq!(outcome, InitializationOutcome::Completed(expected.clone()));
        assert_eq!(controller.status(), InitializationStatus::Failed(expected));
        assert!(!tracker.is_initialized());
        assert!(controller.needs_initialization());
        assert_eq!(controller.status_message(), STATUS_NOT_INITIALIZED);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gnss_timeout_falls_back_to_manual() {
        let (controller, _fixes, tracker) = gnss_controller();
        let home = coordinate(55.9445, -3.1892);
        controller.manual.as_ref().unwrap().set_position(home);

        let outcome = controller.initialize().await;
        let InitializationOutcome::Completed(result) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(result.strategy_used(), "Manual");
        assert_eq!(tracker.reference(), Some(home));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gnss_fix_seeds_tracker() {
        let (controller, fixes, tracker) = gnss_controller();
        let task = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.initialize().await }
        });

        let mut status = controller.subscribe_status();
        status.wait_for(|s| s.is_running()).await.unwrap();
        assert_eq!(controller.status_message(), STATUS_SEARCHING);

        tokio::time::sleep(Duration::from_secs(3)).await;
        let reference = coordinate(51.5007, -0.1246);
        fixes.send_replace(Some(GnssFix::new(reference, 8.0, 3000)));

        let outcome = task.await.unwrap();
        let InitializationOutcome::Completed(result) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(result.strategy_used(), "GPS");
        assert_eq!(result.accuracy_m(), Some(8.0));
        assert_eq!(tracker.reference(), Some(reference));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_call_while_running_is_noop() {
        let (controller, fixes, _tracker) = gnss_controller();
        let task = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.initialize().await }
        });
        controller
            .subscribe_status()
            .wait_for(|s| s.is_running())
            .await
            .unwrap();

        assert_eq!(controller.initialize().await, InitializationOutcome::AlreadyRunning);
        assert!(controller.is_running());

        fixes.send_replace(Some(GnssFix::new(coordinate(10.0, 10.0), 4.0, 0)));
        assert!(matches!(task.await.unwrap(), InitializationOutcome::Completed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_returns_to_idle_without_seeding() {
        let (controller, fixes, tracker) = gnss_controller();
        let task = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.initialize().await }
        });
        controller
            .subscribe_status()
            .wait_for(|s| s.is_running())
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(controller.cancel());
        assert_eq!(task.await.unwrap(), InitializationOutcome::Cancelled);
        assert_eq!(controller.status(), InitializationStatus::Idle);
        assert!(!tracker.is_initialized());

        // late fix after cancellation changes nothing
        fixes.send_replace(Some(GnssFix::new(coordinate(10.0, 10.0), 4.0, 0)));
        tokio::task::yield_now().await;
        assert!(!tracker.is_initialized());

        // nothing left to cancel
        assert!(!controller.cancel());

        // and a fresh attempt can start
        assert!(matches!(controller.initialize().await, InitializationOutcome::Completed(_)));
        assert!(tracker.is_initialized());
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_starting_position() {
        let (controller, _fixes, tracker) = gnss_controller();
        tracker.initialize_with_gps(coordinate(1.0, 1.0));

        let result = controller
            .set_manual_starting_position(55.9445, -3.1892, 0.0)
            .unwrap();
        assert_eq!(result.strategy_used(), "Manual");
        assert_eq!(tracker.reference(), Some(coordinate(55.9445, -3.1892)));
        assert_eq!(controller.status(), InitializationStatus::Succeeded(result));

        assert!(controller.set_manual_starting_position(95.0, 0.0, 0.0).is_err());
        assert_eq!(tracker.reference(), Some(coordinate(55.9445, -3.1892)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_attempt_returns_to_idle() {
        let (controller, fixes, tracker) = gnss_controller();

        let timed_out = tokio::time::timeout(Duration::from_secs(1), controller.initialize()).await;
        assert!(timed_out.is_err());
        assert_eq!(controller.status(), InitializationStatus::Idle);
        assert_eq!(controller.status_message(), STATUS_NOT_INITIALIZED);

        fixes.send_replace(Some(GnssFix::new(coordinate(51.5007, -0.1246), 4.0, 0)));
        let InitializationOutcome::Completed(result) = controller.initialize().await else {
            panic!("expected completion");
        };
        assert_eq!(result.strategy_used(), "GPS");
        assert!(tracker.is_initialized());
    }

    #[test]
    fn test_stale_attempt_cannot_take_newer_slot() {
        let mut slot = AttemptSlot::default();
        let (first, _first_rx) = slot.start();
        assert!(slot.take_if(first).is_some());

        let (second, _second_rx) = slot.start();
        assert_ne!(first, second);
        assert!(slot.take_if(first).is_none());
        assert!(slot.active.is_some());
        assert!(slot.take_if(second).is_some());
    }
}
