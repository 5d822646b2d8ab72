use async_trait::async_trait;

use crate::entities::{
    GeoPoint, Hazard, HazardReceipt, HazardReport, Place, PlaceSuggestion, PositionSample, Route,
    TravelMode,
};
use crate::error::Error;
use crate::session::Snapshot;

#[async_trait]
pub trait PlacesAPI {
    async fn autocomplete(
        &self,
        input: String,
        session_token: String,
    ) -> Result<Vec<PlaceSuggestion>, Error>;
    async fn place_details(&self, place_id: String, session_token: String)
        -> Result<Place, Error>;
}

#[async_trait]
pub trait DirectionsAPI {
    /// `Ok(None)` means the provider found no route, which is an expected outcome.
    async fn get_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        mode: TravelMode,
    ) -> Result<Option<Route>, Error>;
}

#[async_trait]
pub trait HazardsAPI {
    async fn report_hazard(&self, report: HazardReport) -> Result<HazardReceipt, Error>;
    async fn verified_hazards(&self, limit: u32) -> Result<Vec<Hazard>, Error>;
}

#[async_trait]
pub trait NavigationAPI {
    async fn snapshot(&self) -> Result<Snapshot, Error>;
    async fn select_destination(
        &self,
        place_id: String,
        session_token: String,
    ) -> Result<Snapshot, Error>;
    async fn clear_destination(&self) -> Result<Snapshot, Error>;
    async fn change_travel_mode(&self, mode: TravelMode) -> Result<Snapshot, Error>;
    async fn start(&self) -> Result<Snapshot, Error>;
    async fn stop(&self) -> Result<Snapshot, Error>;
    async fn set_speed_limit(&self, speed_limit_kmh: f64) -> Result<Snapshot, Error>;
    async fn push_position(&self, sample: PositionSample) -> Result<Snapshot, Error>;
}

pub trait API: NavigationAPI + PlacesAPI + HazardsAPI {}
