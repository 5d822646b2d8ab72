//! Navigation session state.
//!
//! `NavigationSession` is a plain synchronous state machine: user actions and
//! position samples mutate it directly, while route fetches are described by
//! the `RouteRequest` it hands out and fed back through `apply_route`. Every
//! request carries a token; only the response to the latest one is applied.

mod navigator;

pub use navigator::{Navigator, PositionSubscription, SessionEvent};

use serde::{Deserialize, Serialize};

use crate::entities::{GeoPoint, Place, PositionSample, Route, TravelMode};
use crate::error::{fetch_failed_error, invalid_input_error, invalid_transition_error, Error};

pub const DEFAULT_SPEED_LIMIT_KMH: f64 = 60.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Idle,
    Previewing,
    Active,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestToken(pub u64);

#[derive(Clone, Debug, PartialEq)]
pub struct RouteRequest {
    pub token: RequestToken,
    /// Last known position, if any.
    pub origin: Option<GeoPoint>,
    pub destination: GeoPoint,
    pub mode: TravelMode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteOutcome {
    Applied,
    Stale,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeedReading {
    pub speed_kmh: f64,
    pub speed_limit_kmh: f64,
    pub is_over_limit: bool,
}

impl SpeedReading {
    fn new(sample: &PositionSample, speed_limit_kmh: f64) -> Self {
        let speed_kmh = sample.speed_kmh();

        Self {
            speed_kmh,
            speed_limit_kmh,
            is_over_limit: speed_kmh > speed_limit_kmh,
        }
    }
}

/// Where the map should look. `follow` means heading-up tracking.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub target: GeoPoint,
    pub bearing: f64,
    pub follow: bool,
}

/// Read model handed to the rendering layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub mode: Mode,
    pub destination: Option<Place>,
    pub route: Option<Route>,
    pub travel_mode: TravelMode,
    pub position: Option<PositionSample>,
    pub speed: Option<SpeedReading>,
    pub camera: Option<Camera>,
    pub speed_limit_kmh: f64,
    pub pending: Option<RequestToken>,
}

#[derive(Clone, Debug)]
pub struct NavigationSession {
    mode: Mode,
    destination: Option<Place>,
    route: Option<Route>,
    position: Option<PositionSample>,
    travel_mode: TravelMode,
    speed_limit_kmh: f64,
    speed: Option<SpeedReading>,
    token: RequestToken,
    pending: Option<RouteRequest>,
}

impl Default for NavigationSession {
    fn default() -> Self {
        Self::new(TravelMode::default(), DEFAULT_SPEED_LIMIT_KMH)
    }
}

impl NavigationSession {
    pub fn new(travel_mode: TravelMode, speed_limit_kmh: f64) -> Self {
        Self {
            mode: Mode::Idle,
            destination: None,
            route: None,
            position: None,
            travel_mode,
            speed_limit_kmh,
            speed: None,
            token: RequestToken::default(),
            pending: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn destination(&self) -> Option<&Place> {
        self.destination.as_ref()
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn position(&self) -> Option<&PositionSample> {
        self.position.as_ref()
    }

    pub fn travel_mode(&self) -> TravelMode {
        self.travel_mode
    }

    pub fn speed_limit_kmh(&self) -> f64 {
        self.speed_limit_kmh
    }

    pub fn speed(&self) -> Option<SpeedReading> {
        self.speed
    }

    pub fn token(&self) -> RequestToken {
        self.token
    }

    pub fn pending(&self) -> Option<RequestToken> {
        self.pending.as_ref().map(|request| request.token)
    }

    pub fn camera(&self) -> Option<Camera> {
        let follow = self.mode == Mode::Active;

        self.position.as_ref().map(|sample| Camera {
            target: sample.position,
            bearing: if follow { sample.bearing() } else { 0.0 },
            follow,
        })
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            mode: self.mode,
            destination: self.destination.clone(),
            route: self.route.clone(),
            travel_mode: self.travel_mode,
            position: self.position.clone(),
            speed: self.speed,
            camera: self.camera(),
            speed_limit_kmh: self.speed_limit_kmh,
            pending: self.pending(),
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn select_destination(&mut self, place: Place) -> Result<RouteRequest, Error> {
        match self.mode {
            Mode::Idle | Mode::Previewing => {
                let destination = place.location;

                self.mode = Mode::Previewing;
                self.destination = Some(place);
                self.route = None;

                Ok(self.issue_request(destination, self.travel_mode))
            }
            Mode::Active => Err(invalid_transition_error()),
        }
    }

    /// Requests a route for `mode`. The mode is only adopted together with
    /// the route fetched for it.
    #[tracing::instrument(skip(self))]
    pub fn change_travel_mode(&mut self, mode: TravelMode) -> Result<RouteRequest, Error> {
        let destination = match (self.mode, self.destination.as_ref()) {
            (Mode::Previewing, Some(place)) => place.location,
            _ => return Err(invalid_transition_error()),
        };

        Ok(self.issue_request(destination, mode))
    }

    #[tracing::instrument(skip(self))]
    pub fn start(&mut self) -> Result<(), Error> {
        if self.mode != Mode::Previewing || self.route.is_none() {
            return Err(invalid_transition_error());
        }

        self.mode = Mode::Active;
        self.speed = self
            .position
            .as_ref()
            .map(|sample| SpeedReading::new(sample, self.speed_limit_kmh));

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub fn stop(&mut self) -> Result<(), Error> {
        match self.mode {
            Mode::Active => {
                self.mode = Mode::Previewing;
                self.speed = None;
                Ok(())
            }
            _ => Err(invalid_transition_error()),
        }
    }

    /// Returns to `Idle` from any state and invalidates any in-flight fetch.
    #[tracing::instrument(skip(self))]
    pub fn clear_destination(&mut self) {
        self.mode = Mode::Idle;
        self.destination = None;
        self.route = None;
        self.speed = None;
        self.token = RequestToken(self.token.0 + 1);
        self.pending = None;
    }

    pub fn on_position_sample(&mut self, sample: PositionSample) {
        if self.mode == Mode::Active {
            self.speed = Some(SpeedReading::new(&sample, self.speed_limit_kmh));
        }

        self.position = Some(sample);
    }

    pub fn set_speed_limit(&mut self, speed_limit_kmh: f64) -> Result<(), Error> {
        if !speed_limit_kmh.is_finite() || speed_limit_kmh < 0.0 {
            return Err(invalid_input_error());
        }

        self.speed_limit_kmh = speed_limit_kmh;

        if self.mode == Mode::Active {
            self.speed = self
                .position
                .as_ref()
                .map(|sample| SpeedReading::new(sample, speed_limit_kmh));
        }

        Ok(())
    }

    /// Applies a route-fetch completion.
    ///
    /// Responses to anything but the latest request are discarded untouched.
    /// A failed or empty fetch keeps whatever route and travel mode were
    /// shown before.
    #[tracing::instrument(skip(self, result))]
    pub fn apply_route(
        &mut self,
        token: RequestToken,
        result: Result<Option<Route>, Error>,
    ) -> Result<RouteOutcome, Error> {
        let mode = match self.pending.as_ref() {
            Some(request) if request.token == token => request.mode,
            _ => {
                tracing::debug!("discarding stale route response (current {:?})", self.token);
                return Ok(RouteOutcome::Stale);
            }
        };

        self.pending = None;

        match result {
            Ok(Some(route)) => {
                self.travel_mode = mode;
                self.route = Some(route);
                Ok(RouteOutcome::Applied)
            }
            Ok(None) => {
                tracing::warn!("no route found");
                Err(fetch_failed_error())
            }
            Err(err) => {
                tracing::warn!("route fetch failed: {}", err);
                Err(fetch_failed_error())
            }
        }
    }

    fn issue_request(&mut self, destination: GeoPoint, mode: TravelMode) -> RouteRequest {
        self.token = RequestToken(self.token.0 + 1);

        let request = RouteRequest {
            token: self.token,
            origin: self.position.as_ref().map(|sample| sample.position),
            destination,
            mode,
        };
        self.pending = Some(request.clone());

        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn place() -> Place {
        Place {
            place_id: "ChIJgT_rKAB_PzsRBttnRY6jpz8".into(),
            name: "Harbour".into(),
            location: GeoPoint { lat: 40.7, lng: -120.95 },
        }
    }

    fn route(mode: TravelMode) -> Route {
        Route::new(
            vec![
                GeoPoint { lat: 38.5, lng: -120.2 },
                GeoPoint { lat: 40.7, lng: -120.95 },
            ],
            "262 km".into(),
            "3 hours".into(),
            GeoPoint { lat: 40.7, lng: -120.95 },
            mode,
        )
    }

    fn sample(speed: f64) -> PositionSample {
        PositionSample::new(GeoPoint { lat: 38.5, lng: -120.2 }, 45.0, speed, Utc::now())
    }

    fn previewing_with_route() -> NavigationSession {
        let mut session = NavigationSession::default();
        let request = session.select_destination(place()).unwrap();
        session
            .apply_route(request.token, Ok(Some(route(TravelMode::Driving))))
            .unwrap();
        session
    }

    #[test]
    fn select_destination_issues_request() {
        let mut session = NavigationSession::default();
        session.on_position_sample(sample(0.0));

        let request = session.select_destination(place()).unwrap();

        assert_eq!(session.mode(), Mode::Previewing);
        assert_eq!(request.token, RequestToken(1));
        assert_eq!(request.origin, Some(GeoPoint { lat: 38.5, lng: -120.2 }));
        assert_eq!(request.destination, place().location);
        assert_eq!(request.mode, TravelMode::Driving);
        assert_eq!(session.pending(), Some(request.token));
    }

    #[test]
    fn select_destination_replaces_previous_route() {
        let mut session = previewing_with_route();

        let mut other = place();
        other.location = GeoPoint { lat: 43.252, lng: -126.453 };
        session.select_destination(other).unwrap();

        assert!(session.route().is_none());
        assert_eq!(session.mode(), Mode::Previewing);
    }

    #[test]
    fn select_destination_rejected_while_active() {
        let mut session = previewing_with_route();
        session.start().unwrap();

        let err = session.select_destination(place()).unwrap_err();

        assert!(err.is_invalid_transition());
        assert_eq!(session.mode(), Mode::Active);
        assert!(session.route().is_some());
    }

    #[test]
    fn failed_fetch_stays_previewing_without_route() {
        let mut session = NavigationSession::default();
        let request = session.select_destination(place()).unwrap();

        let err = session.apply_route(request.token, Ok(None)).unwrap_err();

        assert!(err.is_fetch_failed());
        assert_eq!(session.mode(), Mode::Previewing);
        assert!(session.route().is_none());
        assert!(session.pending().is_none());
    }

    #[test]
    fn start_without_route_is_rejected() {
        let mut session = NavigationSession::default();
        session.select_destination(place()).unwrap();
        let before = session.snapshot();

        let err = session.start().unwrap_err();

        assert!(err.is_invalid_transition());
        assert_eq!(session.snapshot(), before);

        let mut idle = NavigationSession::default();
        assert!(idle.start().unwrap_err().is_invalid_transition());
        assert_eq!(idle.mode(), Mode::Idle);
    }

    #[test]
    fn start_and_stop() {
        let mut session = previewing_with_route();

        session.start().unwrap();
        assert_eq!(session.mode(), Mode::Active);

        session.stop().unwrap();
        assert_eq!(session.mode(), Mode::Previewing);
        assert!(session.route().is_some());

        assert!(session.stop().unwrap_err().is_invalid_transition());
    }

    #[test]
    fn stale_response_never_mutates_route() {
        let mut session = NavigationSession::default();
        let first = session.select_destination(place()).unwrap();
        let second = session.change_travel_mode(TravelMode::Walking).unwrap();

        let outcome = session
            .apply_route(first.token, Ok(Some(route(TravelMode::Driving))))
            .unwrap();

        assert_eq!(outcome, RouteOutcome::Stale);
        assert!(session.route().is_none());
        assert_eq!(session.pending(), Some(second.token));

        let outcome = session
            .apply_route(second.token, Ok(Some(route(TravelMode::Walking))))
            .unwrap();

        assert_eq!(outcome, RouteOutcome::Applied);
        assert_eq!(session.route().unwrap().mode, TravelMode::Walking);
    }

    #[test]
    fn stale_failure_is_discarded_too() {
        let mut session = previewing_with_route();
        let request = session.change_travel_mode(TravelMode::Transit).unwrap();
        session.clear_destination();

        let outcome = session
            .apply_route(request.token, Err(fetch_failed_error()))
            .unwrap();

        assert_eq!(outcome, RouteOutcome::Stale);
        assert_eq!(session.mode(), Mode::Idle);
    }

    #[test]
    fn response_after_clear_is_stale() {
        let mut session = NavigationSession::default();
        let request = session.select_destination(place()).unwrap();
        session.clear_destination();

        let outcome = session
            .apply_route(request.token, Ok(Some(route(TravelMode::Driving))))
            .unwrap();

        assert_eq!(outcome, RouteOutcome::Stale);
        assert!(session.route().is_none());
        assert_eq!(session.mode(), Mode::Idle);
    }

    #[test]
    fn change_travel_mode_rejected_when_idle() {
        let mut session = NavigationSession::default();

        let err = session.change_travel_mode(TravelMode::Walking).unwrap_err();

        assert!(err.is_invalid_transition());
        assert_eq!(session.travel_mode(), TravelMode::Driving);
        assert_eq!(session.token(), RequestToken(0));
        assert!(session.pending().is_none());
    }

    #[test]
    fn change_travel_mode_rejected_when_active() {
        let mut session = previewing_with_route();
        session.start().unwrap();
        let token = session.token();

        assert!(session
            .change_travel_mode(TravelMode::Walking)
            .unwrap_err()
            .is_invalid_transition());
        assert_eq!(session.token(), token);
    }

    #[test]
    fn change_travel_mode_swaps_route_only_on_success() {
        let mut session = previewing_with_route();
        let token = session.token();

        let request = session.change_travel_mode(TravelMode::Bicycling).unwrap();

        assert_eq!(request.token, RequestToken(token.0 + 1));
        assert_eq!(request.mode, TravelMode::Bicycling);
        // old route stays visible while the new one is in flight
        assert_eq!(session.route().unwrap().mode, TravelMode::Driving);

        assert_eq!(session.travel_mode(), TravelMode::Driving);

        assert!(session
            .apply_route(request.token, Err(fetch_failed_error()))
            .unwrap_err()
            .is_fetch_failed());
        assert_eq!(session.route().unwrap().mode, TravelMode::Driving);
        assert_eq!(session.travel_mode(), TravelMode::Driving);

        // starting after the failure navigates the route the mode belongs to
        session.start().unwrap();
        assert_eq!(session.travel_mode(), session.route().unwrap().mode);
        session.stop().unwrap();

        let retry = session.change_travel_mode(TravelMode::Bicycling).unwrap();
        session
            .apply_route(retry.token, Ok(Some(route(TravelMode::Bicycling))))
            .unwrap();
        assert_eq!(session.route().unwrap().mode, TravelMode::Bicycling);
        assert_eq!(session.travel_mode(), TravelMode::Bicycling);
    }

    #[test]
    fn clear_destination_from_active() {
        let mut session = previewing_with_route();
        session.start().unwrap();

        session.clear_destination();

        assert_eq!(session.mode(), Mode::Idle);
        assert!(session.route().is_none());
        assert!(session.destination().is_none());
        assert!(session.speed().is_none());
    }

    #[test]
    fn over_limit_while_active() {
        let mut session = previewing_with_route();
        session.start().unwrap();

        session.on_position_sample(sample(20.0));

        let speed = session.speed().unwrap();
        assert!((speed.speed_kmh - 72.0).abs() < 1e-9);
        assert!(speed.is_over_limit);

        session.on_position_sample(sample(10.0));
        assert!(!session.speed().unwrap().is_over_limit);
    }

    #[test]
    fn position_outside_active_only_updates_sample() {
        let mut session = NavigationSession::default();

        session.on_position_sample(sample(20.0));

        assert!(session.position().is_some());
        assert!(session.speed().is_none());

        let camera = session.camera().unwrap();
        assert!(!camera.follow);
        assert_eq!(camera.bearing, 0.0);
    }

    #[test]
    fn camera_follows_heading_while_active() {
        let mut session = previewing_with_route();
        session.start().unwrap();
        session.on_position_sample(sample(5.0));

        let camera = session.camera().unwrap();

        assert!(camera.follow);
        assert_eq!(camera.bearing, 45.0);
        assert_eq!(camera.target, GeoPoint { lat: 38.5, lng: -120.2 });
    }

    #[test]
    fn speed_limit_update_recomputes_reading() {
        let mut session = previewing_with_route();
        session.on_position_sample(sample(20.0));
        session.start().unwrap();
        assert!(session.speed().unwrap().is_over_limit);

        session.set_speed_limit(80.0).unwrap();
        assert!(!session.speed().unwrap().is_over_limit);

        assert!(session.set_speed_limit(-1.0).is_err());
        assert!(session.set_speed_limit(f64::NAN).is_err());
        assert_eq!(session.speed_limit_kmh(), 80.0);
    }
}
