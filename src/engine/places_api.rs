use super::Engine;

use async_trait::async_trait;

use crate::{
    api::PlacesAPI,
    entities::{Place, PlaceSuggestion},
    error::Error,
};

#[async_trait]
impl PlacesAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn autocomplete(
        &self,
        input: String,
        session_token: String,
    ) -> Result<Vec<PlaceSuggestion>, Error> {
        if input.trim().is_empty() {
            return Ok(Vec::new());
        }

        self.places.autocomplete(input, session_token).await
    }

    #[tracing::instrument(skip(self))]
    async fn place_details(&self, place_id: String, session_token: String) -> Result<Place, Error> {
        self.places.place_details(place_id, session_token).await
    }
}
