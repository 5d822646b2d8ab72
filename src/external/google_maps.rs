use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    api::{DirectionsAPI, PlacesAPI},
    entities::{GeoPoint, Place, PlaceSuggestion, Route, TravelMode},
    error::{fetch_failed_error, invalid_input_error, Error},
    polyline,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct PlaceResult {
    place_id: String,
    name: Option<String>,
    formatted_address: Option<String>,
    geometry: Geometry,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Geometry {
    location: GeoPoint,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Response<T> {
    status: String,
    result: Option<T>,
    predictions: Option<T>,
    routes: Option<T>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct DirectionsRoute {
    overview_polyline: EncodedPolyline,
    legs: Vec<Leg>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct EncodedPolyline {
    points: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Leg {
    distance: TextValue,
    duration: TextValue,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TextValue {
    text: String,
}

/// Google Places and Directions web service client.
#[derive(Clone, Debug)]
pub struct GoogleMaps {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl GoogleMaps {
    pub fn new(api_base: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base,
            api_key,
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Response<T>, Error> {
        let url = format!("https://{}{}", self.api_base, path);

        let res = self
            .client
            .get(url)
            .query(&[("key", &self.api_key)])
            .query(query)
            .send()
            .await?;

        let status_code = res.status().as_u16();

        if (400..500).contains(&status_code) {
            return Err(invalid_input_error());
        } else if status_code != 200 {
            return Err(fetch_failed_error());
        }

        Ok(res.json().await?)
    }
}

#[async_trait]
impl PlacesAPI for GoogleMaps {
    #[tracing::instrument(skip(self))]
    async fn autocomplete(
        &self,
        input: String,
        session_token: String,
    ) -> Result<Vec<PlaceSuggestion>, Error> {
        let data = self
            .get(
                "/maps/api/place/autocomplete/json",
                &[("input", input), ("sessiontoken", session_token)],
            )
            .await?;

        suggestions_from(data)
    }

    #[tracing::instrument(skip(self))]
    async fn place_details(&self, place_id: String, session_token: String) -> Result<Place, Error> {
        let data = self
            .get(
                "/maps/api/place/details/json",
                &[
                    ("place_id", place_id),
                    ("sessiontoken", session_token),
                    ("fields", "place_id,name,formatted_address,geometry".into()),
                ],
            )
            .await?;

        place_from(data)
    }
}

#[async_trait]
impl DirectionsAPI for GoogleMaps {
    #[tracing::instrument(skip(self))]
    async fn get_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        mode: TravelMode,
    ) -> Result<Option<Route>, Error> {
        let data = self
            .get(
                "/maps/api/directions/json",
                &[
                    ("origin", origin.into()),
                    ("destination", destination.into()),
                    ("mode", mode.as_str().into()),
                ],
            )
            .await?;

        route_from(data, destination, mode)
    }
}

fn suggestions_from(data: Response<Vec<PlaceSuggestion>>) -> Result<Vec<PlaceSuggestion>, Error> {
    match data.status.as_str() {
        "OK" => data.predictions.ok_or_else(fetch_failed_error),
        "ZERO_RESULTS" => Ok(Vec::new()),
        status => {
            tracing::warn!("autocomplete returned {}", status);
            Err(fetch_failed_error())
        }
    }
}

fn place_from(data: Response<PlaceResult>) -> Result<Place, Error> {
    if data.status != "OK" {
        tracing::warn!("place details returned {}", data.status);
        return Err(fetch_failed_error());
    }

    let result = data.result.ok_or_else(fetch_failed_error)?;
    let location = GeoPoint::new(result.geometry.location.lat, result.geometry.location.lng)
        .map_err(|_| fetch_failed_error())?;

    Ok(Place {
        place_id: result.place_id,
        name: result
            .name
            .or(result.formatted_address)
            .unwrap_or_default(),
        location,
    })
}

fn route_from(
    data: Response<Vec<DirectionsRoute>>,
    destination: GeoPoint,
    mode: TravelMode,
) -> Result<Option<Route>, Error> {
    match data.status.as_str() {
        "OK" => (),
        "ZERO_RESULTS" | "NOT_FOUND" => return Ok(None),
        status => {
            tracing::warn!("directions returned {}", status);
            return Err(fetch_failed_error());
        }
    }

    let route = match data.routes.and_then(|routes| routes.into_iter().next()) {
        Some(route) => route,
        None => return Ok(None),
    };

    let points = polyline::decode(&route.overview_polyline.points).map_err(|err| {
        tracing::warn!("undecodable overview polyline: {}", err);
        fetch_failed_error()
    })?;

    let leg = route.legs.into_iter().next().ok_or_else(fetch_failed_error)?;

    Ok(Some(Route::new(
        points,
        leg.distance.text,
        leg.duration.text,
        destination,
        mode,
    )))
}
