//! Host-facing surface: sample intake, outputs, listeners and the engine

pub mod callback;
pub mod engine;
pub mod outputs;
pub mod samples;

pub use callback::{CallbackHandle, CallbackRegistry, EngineEvent, EventCallback};
pub use engine::{EngineHandle, PositioningEngine};
pub use outputs::EngineOutputs;
pub use samples::{AxisSample, SensorKind, SensorSample};
