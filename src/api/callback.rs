//! Event listeners with explicit unsubscribe

use crate::core::{GpsCoordinate, StepEvent};
use crate::initialization::InitializationStatus;
use std::collections::HashMap;
use std::sync::Arc;

/// Events produced by the engine while processing samples
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Best-estimate position moved
    PositionUpdated {
        position: GpsCoordinate,
        timestamp_ms: u64,
    },
    /// A step was accepted by the stride model
    StepDetected(StepEvent),
    /// A step was dropped for lack of buffered samples
    StepDropped { timestamp_ms: u64 },
    FloorChanged { old_floor: i32, new_floor: i32 },
    ElevatorChanged { in_elevator: bool },
    /// A GNSS fix reset the dead-reckoning position
    DriftCorrected {
        position: GpsCoordinate,
        accuracy_m: f64,
        timestamp_ms: u64,
    },
    /// Gap since the previous sample of the same stream was too large
    LargeGap { stream: &'static str, gap_ms: u64 },
    InitializationChanged(InitializationStatus),
}

pub type EventCallback = Arc<dyn Fn(&EngineEvent) + Send + Sync>;

/// Callback registration handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackHandle(u32);

impl CallbackHandle {
    pub fn id(&self) -> u32 {
        self.0
    }
}

#[derive(Default)]
pub struct CallbackRegistry {
    counter: u32,
    callbacks: HashMap<CallbackHandle, EventCallback>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, callback: EventCallback) -> CallbackHandle {
        self.counter += 1;
        let handle = CallbackHandle(self.counter);
        self.callbacks.insert(handle, callback);
        handle
    }

    /// Returns `false` for an unknown or already removed handle
    pub fn unregister(&mut self, handle: CallbackHandle) -> bool {
        self.callbacks.remove(&handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Callbacks to invoke, so the caller can release its lock first
    pub fn snapshot(&self) -> Vec<EventCallback> {
        self.callbacks.values().cloned().collect()
    }
}
