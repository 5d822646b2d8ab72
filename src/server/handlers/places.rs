use axum::extract::{Extension, Json, Path, Query};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{Place, PlaceSuggestion};
use crate::error::Error;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct SuggestionsParams {
    input: String,
    session_token: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct FindParams {
    session_token: Option<String>,
}

pub async fn find_suggestions(
    Extension(api): Extension<DynAPI>,
    Query(params): Query<SuggestionsParams>,
) -> Result<Json<Vec<PlaceSuggestion>>, Error> {
    let session_token = params
        .session_token
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let suggestions = api.autocomplete(params.input, session_token).await?;

    Ok(suggestions.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<String>,
    Query(params): Query<FindParams>,
) -> Result<Json<Place>, Error> {
    let session_token = params
        .session_token
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let place = api.place_details(id, session_token).await?;

    Ok(place.into())
}
