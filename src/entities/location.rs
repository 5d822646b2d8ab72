use geo_types::Point;
use serde::{Deserialize, Serialize};

use crate::error::{invalid_input_error, Error};

const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A WGS84 coordinate in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self, Error> {
        if !is_valid(lat, lng) {
            return Err(invalid_input_error());
        }

        Ok(Self { lat, lng })
    }

    pub fn is_valid(&self) -> bool {
        is_valid(self.lat, self.lng)
    }

    /// Great-circle distance in meters.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlng = (other.lng - self.lng).to_radians();

        let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);

        2.0 * EARTH_RADIUS_M * h.sqrt().asin()
    }

    /// Initial bearing towards `other` in degrees, [0, 360).
    pub fn bearing_to(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlng = (other.lng - self.lng).to_radians();

        let y = dlng.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlng.cos();

        (y.atan2(x).to_degrees() + 360.0) % 360.0
    }
}

fn is_valid(lat: f64, lng: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}

impl From<GeoPoint> for Point<f64> {
    fn from(point: GeoPoint) -> Self {
        Point::new(point.lng, point.lat)
    }
}

impl From<Point<f64>> for GeoPoint {
    fn from(point: Point<f64>) -> Self {
        Self {
            lat: point.y(),
            lng: point.x(),
        }
    }
}

impl From<GeoPoint> for String {
    fn from(point: GeoPoint) -> Self {
        format!("{},{}", point.lat, point.lng)
    }
}

#[test]
fn geo_point_range_test() {
    assert!(GeoPoint::new(38.5, -120.2).is_ok());
    assert!(GeoPoint::new(90.0, 180.0).is_ok());
    assert!(GeoPoint::new(90.5, 0.0).is_err());
    assert!(GeoPoint::new(0.0, -180.1).is_err());
    assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
}

#[test]
fn geo_point_geometry_test() {
    let point = GeoPoint { lat: 40.7, lng: -120.95 };
    let geo: Point<f64> = point.into();

    assert_eq!(geo.x(), -120.95);
    assert_eq!(geo.y(), 40.7);
    assert_eq!(GeoPoint::from(geo), point);

    let query: String = point.into();
    assert_eq!(query, "40.7,-120.95");
}

#[test]
fn geo_point_distance_and_bearing_test() {
    let origin = GeoPoint { lat: 0.0, lng: 0.0 };

    // one degree of longitude at the equator
    let east = GeoPoint { lat: 0.0, lng: 1.0 };
    assert!((origin.distance_to(&east) - 111_195.0).abs() < 10.0);
    assert!((origin.bearing_to(&east) - 90.0).abs() < 0.1);

    let north = GeoPoint { lat: 1.0, lng: 0.0 };
    assert!(origin.bearing_to(&north).abs() < 0.1);
}
