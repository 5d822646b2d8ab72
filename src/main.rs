use saferoute::config::Config;
use saferoute::engine::Engine;
use saferoute::error::Error;
use saferoute::server::serve;
use saferoute::session::SessionEvent;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let engine = Engine::new(&config);

    let mut events = engine.navigator().subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let SessionEvent::RouteFetchFailed { token, error } = event {
                tracing::warn!("route request {:?} failed: {}", token, error);
            }
        }
    });

    serve(engine, config.listen_addr).await
}
