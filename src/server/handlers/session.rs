use axum::extract::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{PositionSample, TravelMode};
use crate::error::{invalid_input_error, Error};
use crate::server::DynAPI;
use crate::session::Snapshot;

#[derive(Serialize, Deserialize)]
pub struct SelectDestinationParams {
    place_id: String,
    session_token: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ChangeTravelModeParams {
    mode: TravelMode,
}

#[derive(Serialize, Deserialize)]
pub struct SetSpeedLimitParams {
    speed_limit_kmh: f64,
}

pub async fn find(Extension(api): Extension<DynAPI>) -> Result<Json<Snapshot>, Error> {
    let snapshot = api.snapshot().await?;

    Ok(snapshot.into())
}

pub async fn select_destination(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<SelectDestinationParams>,
) -> Result<Json<Snapshot>, Error> {
    let session_token = params
        .session_token
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let snapshot = api
        .select_destination(params.place_id, session_token)
        .await?;

    Ok(snapshot.into())
}

pub async fn clear_destination(Extension(api): Extension<DynAPI>) -> Result<Json<Snapshot>, Error> {
    let snapshot = api.clear_destination().await?;

    Ok(snapshot.into())
}

pub async fn change_travel_mode(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<ChangeTravelModeParams>,
) -> Result<Json<Snapshot>, Error> {
    let snapshot = api.change_travel_mode(params.mode).await?;

    Ok(snapshot.into())
}

pub async fn start(Extension(api): Extension<DynAPI>) -> Result<Json<Snapshot>, Error> {
    let snapshot = api.start().await?;

    Ok(snapshot.into())
}

pub async fn stop(Extension(api): Extension<DynAPI>) -> Result<Json<Snapshot>, Error> {
    let snapshot = api.stop().await?;

    Ok(snapshot.into())
}

pub async fn set_speed_limit(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<SetSpeedLimitParams>,
) -> Result<Json<Snapshot>, Error> {
    let snapshot = api.set_speed_limit(params.speed_limit_kmh).await?;

    Ok(snapshot.into())
}

pub async fn push_position(
    Extension(api): Extension<DynAPI>,
    Json(sample): Json<PositionSample>,
) -> Result<Json<Snapshot>, Error> {
    if !sample.position.is_valid() {
        return Err(invalid_input_error());
    }

    let snapshot = api.push_position(sample).await?;

    Ok(snapshot.into())
}
