use axum::extract::{Extension, Json, Query};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Hazard, HazardReceipt, HazardReport, HazardType};
use crate::error::Error;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct ReportParams {
    hazard_type: HazardType,
    latitude: f64,
    longitude: f64,
    observed_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize)]
pub struct VerifiedParams {
    limit: Option<u32>,
}

pub async fn report(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<ReportParams>,
) -> Result<(StatusCode, Json<HazardReceipt>), Error> {
    let report = HazardReport {
        hazard_type: params.hazard_type,
        latitude: params.latitude,
        longitude: params.longitude,
        observed_at: params.observed_at.unwrap_or_else(Utc::now),
    };

    let receipt = api.report_hazard(report).await?;

    Ok((StatusCode::CREATED, receipt.into()))
}

pub async fn verified(
    Extension(api): Extension<DynAPI>,
    Query(params): Query<VerifiedParams>,
) -> Result<Json<Vec<Hazard>>, Error> {
    let hazards = api.verified_hazards(params.limit.unwrap_or(100)).await?;

    Ok(hazards.into())
}
