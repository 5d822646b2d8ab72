use super::Engine;

use async_trait::async_trait;

use crate::{
    api::NavigationAPI,
    entities::{PositionSample, TravelMode},
    error::Error,
    session::Snapshot,
};

#[async_trait]
impl NavigationAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn snapshot(&self) -> Result<Snapshot, Error> {
        self.navigator.snapshot().await
    }

    /// Looks the place up first; a failed lookup leaves the session untouched.
    #[tracing::instrument(skip(self))]
    async fn select_destination(
        &self,
        place_id: String,
        session_token: String,
    ) -> Result<Snapshot, Error> {
        let place = self.places.place_details(place_id, session_token).await?;

        tracing::info!("destination selected: {}", place.name);

        self.navigator.select_destination(place).await
    }

    #[tracing::instrument(skip(self))]
    async fn clear_destination(&self) -> Result<Snapshot, Error> {
        self.navigator.clear_destination().await
    }

    #[tracing::instrument(skip(self))]
    async fn change_travel_mode(&self, mode: TravelMode) -> Result<Snapshot, Error> {
        self.navigator.change_travel_mode(mode).await
    }

    #[tracing::instrument(skip(self))]
    async fn start(&self) -> Result<Snapshot, Error> {
        self.navigator.start().await
    }

    #[tracing::instrument(skip(self))]
    async fn stop(&self) -> Result<Snapshot, Error> {
        self.navigator.stop().await
    }

    #[tracing::instrument(skip(self))]
    async fn set_speed_limit(&self, speed_limit_kmh: f64) -> Result<Snapshot, Error> {
        self.navigator.set_speed_limit(speed_limit_kmh).await
    }

    async fn push_position(&self, sample: PositionSample) -> Result<Snapshot, Error> {
        self.navigator.push_position(sample).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use tokio_test::block_on;

    use crate::{
        api::{DirectionsAPI, HazardsAPI, NavigationAPI, PlacesAPI},
        engine::Engine,
        entities::{
            GeoPoint, Hazard, HazardReceipt, HazardReport, Place, PlaceSuggestion,
            PositionSample, Route, TravelMode,
        },
        error::{fetch_failed_error, Error},
        session::{Mode, NavigationSession, Navigator, SessionEvent},
    };

    struct FakeMaps;

    #[async_trait]
    impl PlacesAPI for FakeMaps {
        async fn autocomplete(
            &self,
            input: String,
            _session_token: String,
        ) -> Result<Vec<PlaceSuggestion>, Error> {
            Ok(vec![PlaceSuggestion {
                place_id: "harbour".into(),
                description: input,
            }])
        }

        async fn place_details(
            &self,
            place_id: String,
            _session_token: String,
        ) -> Result<Place, Error> {
            match place_id.as_str() {
                "harbour" => Ok(Place {
                    place_id,
                    name: "Harbour".into(),
                    location: GeoPoint { lat: 40.7, lng: -120.95 },
                }),
                _ => Err(fetch_failed_error()),
            }
        }
    }

    #[async_trait]
    impl DirectionsAPI for FakeMaps {
        async fn get_route(
            &self,
            origin: GeoPoint,
            destination: GeoPoint,
            mode: TravelMode,
        ) -> Result<Option<Route>, Error> {
            Ok(Some(Route::new(
                vec![origin, destination],
                "262 km".into(),
                "3 hours".into(),
                destination,
                mode,
            )))
        }
    }

    struct NoHazards;

    #[async_trait]
    impl HazardsAPI for NoHazards {
        async fn report_hazard(&self, _report: HazardReport) -> Result<HazardReceipt, Error> {
            Err(fetch_failed_error())
        }

        async fn verified_hazards(&self, _limit: u32) -> Result<Vec<Hazard>, Error> {
            Ok(Vec::new())
        }
    }

    fn engine() -> Engine {
        let maps = Arc::new(FakeMaps);
        let navigator = Navigator::spawn(NavigationSession::default(), maps.clone());

        Engine::with(navigator, maps, Arc::new(NoHazards))
    }

    #[test]
    fn select_destination_fetches_route() {
        block_on(async {
            let engine = engine();
            let mut events = engine.navigator().subscribe_events();

            engine
                .push_position(PositionSample::new(
                    GeoPoint { lat: 38.5, lng: -120.2 },
                    0.0,
                    0.0,
                    Utc::now(),
                ))
                .await
                .unwrap();

            let snapshot = engine
                .select_destination("harbour".into(), "session".into())
                .await
                .unwrap();
            assert_eq!(snapshot.mode, Mode::Previewing);
            assert_eq!(snapshot.destination.unwrap().name, "Harbour");

            loop {
                if let Ok(SessionEvent::Changed(snapshot)) = events.recv().await {
                    if snapshot.route.is_some() {
                        break;
                    }
                }
            }

            assert_eq!(engine.start().await.unwrap().mode, Mode::Active);
        });
    }

    #[test]
    fn failed_place_lookup_leaves_session_idle() {
        block_on(async {
            let engine = engine();

            let err = engine
                .select_destination("nowhere".into(), "session".into())
                .await
                .unwrap_err();

            assert!(err.is_fetch_failed());
            assert_eq!(engine.snapshot().await.unwrap().mode, Mode::Idle);
        });
    }

    #[test]
    fn blank_autocomplete_skips_lookup() {
        block_on(async {
            let engine = engine();

            assert!(engine
                .autocomplete("  ".into(), "session".into())
                .await
                .unwrap()
                .is_empty());
            assert_eq!(
                engine
                    .autocomplete("harb".into(), "session".into())
                    .await
                    .unwrap()
                    .len(),
                1
            );
        });
    }

    #[test]
    fn travel_mode_change_requires_preview() {
        block_on(async {
            let engine = engine();

            let err = engine
                .change_travel_mode(TravelMode::Walking)
                .await
                .unwrap_err();

            assert!(err.is_invalid_transition());
            assert_eq!(
                engine.snapshot().await.unwrap().travel_mode,
                TravelMode::Driving
            );
        });
    }
}
