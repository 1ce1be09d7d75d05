//! End-to-end scenarios through `PositioningEngine`
//!
//! Each test drives the engine only through samples and the public API, the
//! way a host application would.

use pdr_positioning::{
    AxisSample, CoordinateEngine, EngineConfig, EngineEvent, EnuCoordinate, GpsCoordinate,
    InitializationOutcome, InitializationStatus, PositioningEngine, PositioningError, SensorSample,
};
use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;
use std::time::Duration;

const REFERENCE_LAT: f64 = 51.5007;
const REFERENCE_LON: f64 = -0.1246;

fn engine() -> Arc<PositioningEngine> {
    Arc::new(PositioningEngine::new(EngineConfig::default()).unwrap())
}

fn gnss(latitude: f64, longitude: f64, accuracy_m: f64, timestamp_ms: u64) -> SensorSample {
    SensorSample::Gnss {
        latitude,
        longitude,
        altitude: 0.0,
        accuracy_m,
        timestamp_ms,
    }
}

fn heading(azimuth: f64, timestamp_ms: u64) -> SensorSample {
    let half = -azimuth / 2.0;
    SensorSample::RotationVector {
        x: 0.0,
        y: 0.0,
        z: half.sin(),
        w: Some(half.cos()),
        timestamp_ms,
    }
}

/// Accelerometer window followed by a step trigger
fn step(engine: &PositioningEngine, timestamp_ms: u64) -> Vec<EngineEvent> {
    for (i, m) in [9.3, 12.4, 10.1, 8.7, 11.0].into_iter().enumerate() {
        engine.handle_sample(SensorSample::Accelerometer(AxisSample::new(
            0.0,
            0.0,
            m,
            timestamp_ms + i as u64 * 20,
        )));
    }
    engine.handle_sample(SensorSample::Step {
        timestamp_ms: timestamp_ms + 100,
    })
}

async fn cold_start(engine: &PositioningEngine) {
    engine.handle_sample(gnss(REFERENCE_LAT, REFERENCE_LON, 8.0, 0));
    let outcome = engine.initialize().await;
    assert!(matches!(outcome, InitializationOutcome::Completed(ref r) if r.is_success()));
}

#[tokio::test(start_paused = true)]
async fn test_cold_start_with_good_gps() {
    let engine = engine();
    assert_eq!(engine.current_gps(), Err(PositioningError::UninitializedTracker));
    assert_eq!(
        engine.status_message(),
        "PDR not initialized. Please start initialization."
    );

    let task = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.initialize().await }
    });
    engine
        .subscribe_initialization()
        .wait_for(|s| s.is_running())
        .await
        .unwrap();
    assert_eq!(engine.status_message(), "Searching for your location...");

    tokio::time::sleep(Duration::from_secs(4)).await;
    engine.handle_sample(gnss(REFERENCE_LAT, REFERENCE_LON, 8.0, 4000));

    let InitializationOutcome::Completed(result) = task.await.unwrap() else {
        panic!("initialization did not complete");
    };
    assert!(result.is_success());
    assert_eq!(result.strategy_used(), "GPS");
    assert_eq!(result.accuracy_m(), Some(8.0));

    assert_eq!(engine.tracker().current_enu(), Ok(EnuCoordinate::default()));
    let reference = engine.tracker().reference().unwrap();
    assert_eq!(reference.latitude(), REFERENCE_LAT);
    assert_eq!(reference.longitude(), REFERENCE_LON);
    assert!(engine.outputs().position().is_some());
    assert!(matches!(engine.initialization_status(), InitializationStatus::Succeeded(_)));
    assert_eq!(engine.status_message(), "PDR ready and tracking your position.");
}

#[tokio::test(start_paused = true)]
async fn test_no_fix_times_out_and_fails() {
    let engine = engine();
    engine.handle_sample(gnss(REFERENCE_LAT, REFERENCE_LON, 45.0, 0));

    let InitializationOutcome::Completed(result) = engine.initialize().await else {
        panic!("initialization did not complete");
    };
    assert!(!result.is_success());
    assert_eq!(result.strategy_used(), "None");
    assert_eq!(result.message(), "All initialization strategies failed");
    assert!(engine.needs_initialization());
    assert!(matches!(engine.initialization_status(), InitializationStatus::Failed(_)));
}

#[tokio::test(start_paused = true)]
async fn test_step_sequence_north_then_east() {
    let engine = engine();
    cold_start(&engine).await;
    engine.use_manual_step_length(true);
    engine.set_manual_step_length(0.75).unwrap();

    engine.handle_sample(heading(0.0, 100));
    step(&engine, 200);
    engine.handle_sample(heading(FRAC_PI_2, 400));
    let events = step(&engine, 500);

    let enu = engine.tracker().current_enu().unwrap();
    assert!((enu.east - 0.75).abs() < 1e-6);
    assert!((enu.north - 0.75).abs() < 1e-6);
    assert_eq!(engine.tracker().state().step_count, 2);

    let Some(EngineEvent::PositionUpdated { position, .. }) = events
        .iter()
        .find(|e| matches!(e, EngineEvent::PositionUpdated { .. }))
    else {
        panic!("no position update");
    };
    let reference = GpsCoordinate::new(REFERENCE_LAT, REFERENCE_LON, 0.0).unwrap();
    let back = CoordinateEngine::gps_to_enu(position, &reference);
    assert!((back.east - 0.75).abs() < 1e-3);
    assert!((back.north - 0.75).abs() < 1e-3);
}

#[tokio::test(start_paused = true)]
async fn test_drift_correction_gating() {
    let engine = engine();
    cold_start(&engine).await;

    engine.use_manual_step_length(true);
    for i in 0..4 {
        step(&engine, 1000 + i * 200);
    }
    let walked = engine.tracker().current_enu().unwrap();
    assert!((walked.north - 3.0).abs() < 1e-6);

    // 25 m accuracy, 5 s after initialization: observed only
    let drifted = (REFERENCE_LAT + 0.0001, REFERENCE_LON);
    engine.handle_sample(gnss(drifted.0, drifted.1, 25.0, 5000));
    assert_eq!(engine.tracker().current_enu().unwrap(), walked);
    let observed = engine.outputs().observed_gnss().unwrap();
    assert_eq!(observed.accuracy_m, 25.0);

    // 10 m accuracy, 35 s after the interval started: applied
    let events = engine.handle_sample(gnss(drifted.0, drifted.1, 10.0, 35_000));
    assert!(events.iter().any(|e| matches!(e, EngineEvent::DriftCorrected { .. })));
    let corrected = engine.tracker().current_enu().unwrap();
    assert!((corrected.north - 11.1).abs() < 0.1);
    assert_ne!(corrected, walked);

    // accurate, but inside the next interval: observed only
    engine.handle_sample(gnss(REFERENCE_LAT, REFERENCE_LON, 3.0, 40_000));
    assert_eq!(engine.tracker().current_enu().unwrap(), corrected);
}

#[tokio::test(start_paused = true)]
async fn test_manual_override_reanchors() {
    let engine = engine();
    cold_start(&engine).await;
    engine.use_manual_step_length(true);
    step(&engine, 100);

    let result = engine.set_manual_starting_position(55.9445, -3.1892, 0.0).unwrap();
    assert_eq!(result.strategy_used(), "Manual");
    assert_eq!(engine.tracker().current_enu(), Ok(EnuCoordinate::default()));
    assert_eq!(engine.tracker().reference().unwrap().latitude(), 55.9445);

    assert!(engine.set_manual_starting_position(12.0, 190.0, 0.0).is_err());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_leaves_engine_idle() {
    let engine = engine();
    let task = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.initialize().await }
    });
    engine
        .subscribe_initialization()
        .wait_for(|s| s.is_running())
        .await
        .unwrap();

    assert!(engine.cancel_initialization());
    assert_eq!(task.await.unwrap(), InitializationOutcome::Cancelled);
    assert_eq!(engine.initialization_status(), InitializationStatus::Idle);
    assert!(engine.needs_initialization());

    // a fix arriving afterwards does not seed anything on its own
    engine.handle_sample(gnss(REFERENCE_LAT, REFERENCE_LON, 4.0, 100));
    assert!(engine.needs_initialization());
}
