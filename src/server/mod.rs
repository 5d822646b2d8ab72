mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, patch, post},
    Router,
};

use crate::api::API;
use crate::error::{unexpected_error, Error};
use crate::server::handlers::{hazards, places, session};

type DynAPI = Arc<dyn API + Send + Sync>;

pub fn router<T: API + Sync + Send + 'static>(api: T) -> Router {
    let api = Arc::new(api) as DynAPI;

    Router::new()
        .route("/session", get(session::find))
        .route(
            "/session/destination",
            post(session::select_destination).delete(session::clear_destination),
        )
        .route("/session/travel_mode", patch(session::change_travel_mode))
        .route("/session/start", patch(session::start))
        .route("/session/stop", patch(session::stop))
        .route("/session/speed_limit", patch(session::set_speed_limit))
        .route("/session/position", post(session::push_position))
        .route("/places/suggestions", get(places::find_suggestions))
        .route("/places/:id", get(places::find))
        .route("/hazards/report", post(hazards::report))
        .route("/hazards/verified", get(hazards::verified))
        .layer(Extension(api))
}

pub async fn serve<T: API + Sync + Send + 'static>(api: T, addr: SocketAddr) -> Result<(), Error> {
    let app = router(api);

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(|err| {
            tracing::error!("server error: {}", err);
            unexpected_error()
        })
}
