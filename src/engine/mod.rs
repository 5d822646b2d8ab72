mod hazards_api;
mod navigation_api;
mod places_api;

use std::sync::Arc;

use crate::{
    api::{HazardsAPI, PlacesAPI, API},
    config::Config,
    external::{GoogleMaps, SafeRouteHazards},
    session::{NavigationSession, Navigator},
};

type DynPlaces = Arc<dyn PlacesAPI + Send + Sync>;
type DynHazards = Arc<dyn HazardsAPI + Send + Sync>;

pub struct Engine {
    navigator: Navigator,
    places: DynPlaces,
    hazards: DynHazards,
}

impl Engine {
    /// Wires the Google and SafeRoute clients to a fresh session.
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub fn new(config: &Config) -> Self {
        let google_maps = Arc::new(GoogleMaps::new(
            config.google_maps_api_base.clone(),
            config.google_maps_api_key.clone(),
        ));
        let hazards = Arc::new(SafeRouteHazards::new(config.saferoute_api_base.clone()));

        let session = NavigationSession::new(config.default_travel_mode, config.speed_limit_kmh);
        let navigator = Navigator::spawn(session, google_maps.clone());

        Self::with(navigator, google_maps, hazards)
    }

    pub fn with(navigator: Navigator, places: DynPlaces, hazards: DynHazards) -> Self {
        Self {
            navigator,
            places,
            hazards,
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }
}

impl API for Engine {}
