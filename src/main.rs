use pdr_positioning::{
    AxisSample, ConfigurationManager, EngineEvent, InitializationOutcome, PositioningEngine, SensorSample,
};
use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

/// Rotation-vector sample for a device lying flat with the given azimuth
fn heading_sample(azimuth: f64, timestamp_ms: u64) -> SensorSample {
    let half = -azimuth / 2.0;
    SensorSample::RotationVector {
        x: 0.0,
        y: 0.0,
        z: half.sin(),
        w: Some(half.cos()),
        timestamp_ms,
    }
}

/// Synthetic walk: a GNSS fix, then a 10 x 10 step square
fn demo_samples() -> Vec<SensorSample> {
    let mut samples = vec![SensorSample::Gnss {
        latitude: 51.5007,
        longitude: -0.1246,
        altitude: 0.0,
        accuracy_m: 8.0,
        timestamp_ms: 0,
    }];

    let mut t = 100;
    for leg in 0..4 {
        let azimuth = leg as f64 * FRAC_PI_2;
        for _ in 0..10 {
            samples.push(heading_sample(azimuth, t));
            for m in [9.4, 11.8, 13.1, 8.2, 9.9] {
                t += 20;
                samples.push(SensorSample::Accelerometer(AxisSample::new(0.0, 0.0, m, t)));
            }
            samples.push(SensorSample::Pressure { hpa: 1013.25, timestamp_ms: t });
            t += 20;
            samples.push(SensorSample::Step { timestamp_ms: t });
        }
    }
    samples
}

async fn replay(engine: Arc<PositioningEngine>, samples: Vec<SensorSample>) -> Result<(), Box<dyn std::error::Error>> {
    engine.register_callback(Arc::new(|event| match event {
        EngineEvent::PositionUpdated { position, timestamp_ms } => println!(
            "[{:>6} ms] position lat={:.7}, lon={:.7}",
            timestamp_ms,
            position.latitude(),
            position.longitude()
        ),
        EngineEvent::FloorChanged { old_floor, new_floor } => {
            println!("floor {} -> {}", old_floor, new_floor)
        }
        EngineEvent::ElevatorChanged { in_elevator } => println!("in elevator: {}", in_elevator),
        _ => {}
    }));

    println!("{}", engine.status_message());
    let init = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.initialize().await }
    });

    for sample in samples {
        engine.handle_sample(sample);
        tokio::task::yield_now().await;
    }

    if !init.is_finished() {
        engine.cancel_initialization();
    }
    match init.await? {
        InitializationOutcome::Completed(result) => {
            println!("Initialization via {}: {}", result.strategy_used(), result.message())
        }
        InitializationOutcome::Cancelled => println!("Initialization cancelled: no usable fix in input"),
        InitializationOutcome::AlreadyRunning => {}
    }
    println!("{}", engine.status_message());

    let snapshot = engine.tracker().snapshot();
    println!(
        "Final local position (ENU): east={:.2} m, north={:.2} m after {} steps",
        snapshot.state.position.east, snapshot.state.position.north, snapshot.state.step_count
    );
    if let Ok(position) = engine.current_gps() {
        println!(
            "Final position (lat/lon): lat={:.7}, lon={:.7}",
            position.latitude(),
            position.longitude()
        );
    }
    println!(
        "Floor {}, relative elevation {:.2} m, average step {:.2} m",
        engine.outputs().floor_index(),
        engine.outputs().relative_elevation(),
        engine.take_average_step_length()
    );
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map_or("pdr_positioning", |s| s.as_str());

    if args.len() == 2 && args[1] == "--demo" {
        let engine = Arc::new(PositioningEngine::with_manager(ConfigurationManager::new()));
        return replay(engine, demo_samples()).await;
    }

    if args.len() != 2 && args.len() != 3 {
        eprintln!("Usage: {} <samples_json_file> [config_json_file]", program);
        eprintln!("   or: {} --demo", program);
        return Err("Invalid arguments".into());
    }

    let manager = match args.get(2) {
        Some(path) => ConfigurationManager::from_file(path)?,
        None => ConfigurationManager::new(),
    };

    let json_data = std::fs::read_to_string(&args[1])?;
    let samples: Vec<SensorSample> = serde_json::from_str(&json_data)?;
    println!("Replaying {} samples", samples.len());

    replay(Arc::new(PositioningEngine::with_manager(manager)), samples).await
}
