use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{GeoPoint, Route};
use crate::error::{invalid_input_error, Error};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HazardType {
    Accident,
    Pothole,
    Roadblock,
    Debris,
}

/// What a driver submits. Status and verification are owned by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HazardReport {
    pub hazard_type: HazardType,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(with = "naive_utc")]
    pub observed_at: DateTime<Utc>,
}

impl HazardReport {
    pub fn new(hazard_type: HazardType, location: GeoPoint, observed_at: DateTime<Utc>) -> Self {
        Self {
            hazard_type,
            latitude: location.lat,
            longitude: location.lng,
            observed_at,
        }
    }

    /// Observations must lie within the last 24 hours and not in the future.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), Error> {
        GeoPoint::new(self.latitude, self.longitude)?;

        if self.observed_at > now || now - self.observed_at > Duration::hours(24) {
            return Err(invalid_input_error());
        }

        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HazardReceipt {
    pub status: String,
    pub message: String,
    pub hazard_id: String,
    pub timestamp: String,
}

/// A verified hazard as shown to drivers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub id: String,
    pub hazard_type: HazardType,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(with = "naive_utc")]
    pub created_at: DateTime<Utc>,
}

impl Hazard {
    pub fn location(&self) -> GeoPoint {
        GeoPoint {
            lat: self.latitude,
            lng: self.longitude,
        }
    }
}

/// Hazards within `radius_m` meters of any vertex of the route.
pub fn hazards_along_route<'a>(
    route: &Route,
    hazards: &'a [Hazard],
    radius_m: f64,
) -> Vec<&'a Hazard> {
    hazards
        .iter()
        .filter(|hazard| {
            let location = hazard.location();
            route
                .points
                .iter()
                .any(|point| point.distance_to(&location) <= radius_m)
        })
        .collect()
}

/// The hazard backend speaks zone-less UTC timestamps.
mod naive_utc {
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.naive_utc().format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;

        if let Ok(aware) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(aware.with_timezone(&Utc));
        }

        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .map(|naive| Utc.from_utc_datetime(&naive))
            .map_err(de::Error::custom)
    }
}

#[test]
fn hazard_report_validation_test() {
    let now = Utc::now();
    let location = GeoPoint { lat: 43.0, lng: -71.5 };

    let report = HazardReport::new(HazardType::Pothole, location, now - Duration::minutes(5));
    assert!(report.validate(now).is_ok());

    let future = HazardReport::new(HazardType::Pothole, location, now + Duration::minutes(5));
    assert!(future.validate(now).is_err());

    let stale = HazardReport::new(HazardType::Accident, location, now - Duration::hours(25));
    assert!(stale.validate(now).is_err());

    let mut off_map = report.clone();
    off_map.latitude = 91.0;
    assert!(off_map.validate(now).is_err());
}

#[test]
fn hazard_wire_format_test() {
    let hazard: Hazard = serde_json::from_value(serde_json::json!({
        "id": "6a1f",
        "hazard_type": "ROADBLOCK",
        "latitude": 43.0,
        "longitude": -71.5,
        "created_at": "2024-05-01T12:00:00Z"
    }))
    .unwrap();

    assert_eq!(hazard.hazard_type, HazardType::Roadblock);
    assert_eq!(hazard.location(), GeoPoint { lat: 43.0, lng: -71.5 });

    let naive: Hazard = serde_json::from_value(serde_json::json!({
        "id": "6a20",
        "hazard_type": "POTHOLE",
        "latitude": 43.0,
        "longitude": -71.5,
        "created_at": "2024-05-01T12:00:00.250000"
    }))
    .unwrap();
    assert_eq!(naive.created_at.timestamp_millis() - hazard.created_at.timestamp_millis(), 250);

    let report = HazardReport::new(HazardType::Debris, naive.location(), hazard.created_at);
    let wire = serde_json::to_value(&report).unwrap();
    assert_eq!(wire["observed_at"], "2024-05-01T12:00:00");
    assert_eq!(wire["hazard_type"], "DEBRIS");
}

#[test]
fn hazards_along_route_test() {
    use crate::entities::TravelMode;

    let route = Route::new(
        vec![GeoPoint { lat: 0.0, lng: 0.0 }, GeoPoint { lat: 0.0, lng: 0.01 }],
        "1.1 km".into(),
        "2 mins".into(),
        GeoPoint { lat: 0.0, lng: 0.01 },
        TravelMode::Driving,
    );

    let hazard = |id: &str, lat: f64, lng: f64| Hazard {
        id: id.into(),
        hazard_type: HazardType::Debris,
        latitude: lat,
        longitude: lng,
        created_at: Utc::now(),
    };

    let hazards = vec![hazard("near", 0.0005, 0.01), hazard("far", 1.0, 1.0)];
    let nearby = hazards_along_route(&route, &hazards, 100.0);

    assert_eq!(nearby.len(), 1);
    assert_eq!(nearby[0].id, "near");
}
