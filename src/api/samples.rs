//! Inbound sensor and GNSS samples

use serde::{Deserialize, Serialize};

/// Three-axis device-frame reading
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub timestamp_ms: u64,
}

impl AxisSample {
    pub fn new(x: f64, y: f64, z: f64, timestamp_ms: u64) -> Self {
        Self { x, y, z, timestamp_ms }
    }

    pub fn vector(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Which stream a sample belongs to; ordering is tracked per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Accelerometer,
    Gyroscope,
    Magnetometer,
    RotationVector,
    Gravity,
    LinearAcceleration,
    Pressure,
    Step,
    Gnss,
}

impl SensorKind {
    pub fn name(&self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "accelerometer",
            SensorKind::Gyroscope => "gyroscope",
            SensorKind::Magnetometer => "magnetometer",
            SensorKind::RotationVector => "rotation_vector",
            SensorKind::Gravity => "gravity",
            SensorKind::LinearAcceleration => "linear_acceleration",
            SensorKind::Pressure => "pressure",
            SensorKind::Step => "step",
            SensorKind::Gnss => "gnss",
        }
    }

    /// Streams delivered at a steady rate, where a long silence is suspicious.
    /// Steps and fixes arrive only when something happens.
    pub fn is_periodic(&self) -> bool {
        !matches!(self, SensorKind::Step | SensorKind::Gnss)
    }
}

/// One event from the platform sensor or location layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SensorSample {
    Accelerometer(AxisSample),
    Gyroscope(AxisSample),
    Magnetometer(AxisSample),
    RotationVector {
        x: f64,
        y: f64,
        z: f64,
        #[serde(default)]
        w: Option<f64>,
        timestamp_ms: u64,
    },
    Gravity(AxisSample),
    LinearAcceleration(AxisSample),
    /// Static pressure in hPa
    Pressure { hpa: f64, timestamp_ms: u64 },
    /// Step trigger from a hardware or software detector
    Step { timestamp_ms: u64 },
    /// Raw GNSS fix; coordinates are validated by the engine
    Gnss {
        latitude: f64,
        longitude: f64,
        #[serde(default)]
        altitude: f64,
        accuracy_m: f64,
        timestamp_ms: u64,
    },
}

impl SensorSample {
    pub fn kind(&self) -> SensorKind {
        match self {
            SensorSample::Accelerometer(_) => SensorKind::Accelerometer,
            SensorSample::Gyroscope(_) => SensorKind::Gyroscope,
            SensorSample::Magnetometer(_) => SensorKind::Magnetometer,
            SensorSample::RotationVector { .. } => SensorKind::RotationVector,
            SensorSample::Gravity(_) => SensorKind::Gravity,
            SensorSample::LinearAcceleration(_) => SensorKind::LinearAcceleration,
            SensorSample::Pressure { .. } => SensorKind::Pressure,
            SensorSample::Step { .. } => SensorKind::Step,
            SensorSample::Gnss { .. } => SensorKind::Gnss,
        }
    }

    pub fn timestamp_ms(&self) -> u64 {
        match *self {
            SensorSample::Accelerometer(s)
            | SensorSample::Gyroscope(s)
            | SensorSample::Magnetometer(s)
            | SensorSample::Gravity(s)
            | SensorSample::LinearAcceleration(s) => s.timestamp_ms,
            SensorSample::RotationVector { timestamp_ms, .. }
            | SensorSample::Pressure { timestamp_ms, .. }
            | SensorSample::Step { timestamp_ms }
            | SensorSample::Gnss { timestamp_ms, .. } => timestamp_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_timestamp() {
        let sample = SensorSample::Gravity(AxisSample::new(0.0, 0.0, 9.8, 120));
        assert_eq!(sample.kind(), SensorKind::Gravity);
        assert_eq!(sample.timestamp_ms(), 120);

        let step = SensorSample::Step { timestamp_ms: 7 };
        assert_eq!(step.kind(), SensorKind::Step);
        assert_eq!(step.timestamp_ms(), 7);
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{"type":"gnss","latitude":51.5,"longitude":-0.12,"accuracy_m":6.0,"timestamp_ms":10}"#;
        let sample: SensorSample = serde_json::from_str(json).unwrap();
        assert_eq!(
            sample,
            SensorSample::Gnss {
                latitude: 51.5,
                longitude: -0.12,
                altitude: 0.0,
                accuracy_m: 6.0,
                timestamp_ms: 10,
            }
        );

        let json = r#"{"type":"accelerometer","x":0.1,"y":0.2,"z":9.7,"timestamp_ms":3}"#;
        let sample: SensorSample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.kind(), SensorKind::Accelerometer);

        let json = r#"{"type":"rotation_vector","x":0.0,"y":0.0,"z":0.0,"timestamp_ms":3}"#;
        let sample: SensorSample = serde_json::from_str(json).unwrap();
        assert!(matches!(sample, SensorSample::RotationVector { w: None, .. }));
    }
}
