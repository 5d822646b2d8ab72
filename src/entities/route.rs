use std::str::FromStr;

use geo_types::LineString;
use serde::{Deserialize, Serialize};

use crate::entities::GeoPoint;
use crate::error::{invalid_input_error, Error};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Bicycling,
    Transit,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Driving => "driving",
            Self::Walking => "walking",
            Self::Bicycling => "bicycling",
            Self::Transit => "transit",
        }
    }
}

impl FromStr for TravelMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "driving" => Ok(Self::Driving),
            "walking" => Ok(Self::Walking),
            "bicycling" => Ok(Self::Bicycling),
            "transit" => Ok(Self::Transit),
            _ => Err(invalid_input_error()),
        }
    }
}

/// A fetched route, tied to the destination and travel mode it was requested for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub points: Vec<GeoPoint>,
    pub distance_text: String,
    pub duration_text: String,
    pub destination: GeoPoint,
    pub mode: TravelMode,
}

impl Route {
    pub fn new(
        points: Vec<GeoPoint>,
        distance_text: String,
        duration_text: String,
        destination: GeoPoint,
        mode: TravelMode,
    ) -> Self {
        Self {
            points,
            distance_text,
            duration_text,
            destination,
            mode,
        }
    }

    pub fn line_string(&self) -> LineString<f64> {
        self.points
            .iter()
            .map(|point| (point.lng, point.lat))
            .collect::<Vec<_>>()
            .into()
    }
}

#[test]
fn travel_mode_parse_test() {
    assert_eq!("driving".parse::<TravelMode>().unwrap(), TravelMode::Driving);
    assert_eq!(" Transit ".parse::<TravelMode>().unwrap(), TravelMode::Transit);
    assert!("flying".parse::<TravelMode>().is_err());
    assert_eq!(TravelMode::Bicycling.as_str(), "bicycling");
    assert_eq!(
        serde_json::to_string(&TravelMode::Walking).unwrap(),
        "\"walking\""
    );
}

#[test]
fn route_line_string_test() {
    let points = vec![
        GeoPoint { lat: 38.5, lng: -120.2 },
        GeoPoint { lat: 40.7, lng: -120.95 },
    ];
    let route = Route::new(
        points.clone(),
        "262 km".into(),
        "3 hours".into(),
        points[1],
        TravelMode::Driving,
    );

    let line = route.line_string();
    let coords: Vec<_> = line.points().collect();

    assert_eq!(coords.len(), 2);
    assert_eq!(coords[0].x(), -120.2);
    assert_eq!(coords[1].y(), 40.7);
}
