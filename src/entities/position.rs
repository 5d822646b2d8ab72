use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::GeoPoint;

/// A single fix from the location provider.
///
/// `speed` is in meters per second and may be 0 on platforms without
/// velocity sensing. `heading` is in degrees clockwise from north.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub position: GeoPoint,
    pub heading: f64,
    pub speed: f64,
    pub timestamp: DateTime<Utc>,
}

impl PositionSample {
    pub fn new(position: GeoPoint, heading: f64, speed: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            position,
            heading,
            speed,
            timestamp,
        }
    }

    pub fn speed_kmh(&self) -> f64 {
        (self.speed * 3.6).max(0.0)
    }

    /// Heading normalized into [0, 360).
    pub fn bearing(&self) -> f64 {
        self.heading.rem_euclid(360.0)
    }
}

#[test]
fn position_sample_speed_test() {
    let position = GeoPoint { lat: 0.0, lng: 0.0 };

    let sample = PositionSample::new(position, 90.0, 20.0, Utc::now());
    assert!((sample.speed_kmh() - 72.0).abs() < 1e-9);

    let reversing = PositionSample::new(position, 90.0, -3.0, Utc::now());
    assert_eq!(reversing.speed_kmh(), 0.0);
}

#[test]
fn position_sample_bearing_test() {
    let position = GeoPoint { lat: 0.0, lng: 0.0 };

    assert_eq!(PositionSample::new(position, 370.0, 0.0, Utc::now()).bearing(), 10.0);
    assert_eq!(PositionSample::new(position, -90.0, 0.0, Utc::now()).bearing(), 270.0);
}
