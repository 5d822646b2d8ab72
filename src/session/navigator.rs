use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_channel::{Receiver, Sender};
use futures::{Stream, StreamExt};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;

use super::{NavigationSession, RequestToken, RouteOutcome, RouteRequest, Snapshot};
use crate::api::DirectionsAPI;
use crate::entities::{Place, PositionSample, Route, TravelMode};
use crate::error::{fetch_failed_error, unexpected_error, Error};

type DynDirections = Arc<dyn DirectionsAPI + Send + Sync>;
type Reply = oneshot::Sender<Result<Snapshot, Error>>;
type Resolution = (RequestToken, Result<Option<Route>, Error>);

const EVENT_CAPACITY: usize = 64;

#[derive(Clone, Debug)]
pub enum SessionEvent {
    Changed(Snapshot),
    RouteFetchFailed { token: RequestToken, error: Error },
}

enum Command {
    Snapshot {
        reply: Reply,
    },
    SelectDestination {
        place: Place,
        reply: Reply,
    },
    ChangeTravelMode {
        mode: TravelMode,
        reply: Reply,
    },
    Start {
        reply: Reply,
    },
    Stop {
        reply: Reply,
    },
    ClearDestination {
        reply: Reply,
    },
    SetSpeedLimit {
        speed_limit_kmh: f64,
        reply: Reply,
    },
    Position {
        sample: PositionSample,
        subscription: Option<u64>,
        reply: Option<Reply>,
    },
    Subscribe {
        subscription: u64,
    },
    Unsubscribe {
        subscription: u64,
        reply: Option<oneshot::Sender<()>>,
    },
}

/// Handle to the task that owns the navigation session.
///
/// Every operation is queued and applied one at a time by that task, so the
/// handle can be cloned and shared freely across threads.
#[derive(Clone)]
pub struct Navigator {
    commands: Sender<Command>,
    events: broadcast::Sender<SessionEvent>,
    next_subscription: Arc<AtomicU64>,
}

impl Navigator {
    /// Starts the session task. Must be called from within a tokio runtime.
    pub fn spawn(session: NavigationSession, directions: DynDirections) -> Self {
        let (commands, inbox) = async_channel::unbounded();
        let (resolutions, resolved) = async_channel::unbounded();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let actor = Actor {
            session,
            directions,
            events: events.clone(),
            resolutions,
            subscriptions: HashSet::new(),
        };

        tokio::spawn(actor.run(inbox, resolved));

        Self {
            commands,
            events,
            next_subscription: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> Result<Snapshot, Error> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub async fn select_destination(&self, place: Place) -> Result<Snapshot, Error> {
        self.request(|reply| Command::SelectDestination { place, reply })
            .await
    }

    pub async fn change_travel_mode(&self, mode: TravelMode) -> Result<Snapshot, Error> {
        self.request(|reply| Command::ChangeTravelMode { mode, reply })
            .await
    }

    pub async fn start(&self) -> Result<Snapshot, Error> {
        self.request(|reply| Command::Start { reply }).await
    }

    pub async fn stop(&self) -> Result<Snapshot, Error> {
        self.request(|reply| Command::Stop { reply }).await
    }

    pub async fn clear_destination(&self) -> Result<Snapshot, Error> {
        self.request(|reply| Command::ClearDestination { reply })
            .await
    }

    pub async fn set_speed_limit(&self, speed_limit_kmh: f64) -> Result<Snapshot, Error> {
        self.request(|reply| Command::SetSpeedLimit {
            speed_limit_kmh,
            reply,
        })
        .await
    }

    pub async fn push_position(&self, sample: PositionSample) -> Result<Snapshot, Error> {
        self.request(|reply| Command::Position {
            sample,
            subscription: None,
            reply: Some(reply),
        })
        .await
    }

    /// Feeds a position stream into the session until the stream ends or the
    /// returned subscription is cancelled.
    pub fn subscribe_positions<S>(&self, positions: S) -> PositionSubscription
    where
        S: Stream<Item = PositionSample> + Send + 'static,
    {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);

        if self
            .commands
            .try_send(Command::Subscribe { subscription: id })
            .is_err()
        {
            tracing::warn!("navigator stopped, position subscription {} is inert", id);
        }

        let commands = self.commands.clone();
        let forwarder = tokio::spawn(async move {
            let mut positions = Box::pin(positions);

            while let Some(sample) = positions.next().await {
                let command = Command::Position {
                    sample,
                    subscription: Some(id),
                    reply: None,
                };

                if commands.send(command).await.is_err() {
                    return;
                }
            }

            tracing::warn!("position provider {} disconnected", id);

            let _ = commands
                .send(Command::Unsubscribe {
                    subscription: id,
                    reply: None,
                })
                .await;
        });

        PositionSubscription {
            id,
            commands: self.commands.clone(),
            forwarder,
        }
    }

    async fn request<F>(&self, build: F) -> Result<Snapshot, Error>
    where
        F: FnOnce(Reply) -> Command,
    {
        let (reply, response) = oneshot::channel();

        self.commands
            .send(build(reply))
            .await
            .map_err(|_| unexpected_error())?;

        response.await.map_err(|_| unexpected_error())?
    }
}

/// A live position feed into the session.
///
/// Dropping it stops forwarding; `cancel` additionally waits until the session
/// has forgotten the feed, after which none of its samples are applied.
pub struct PositionSubscription {
    id: u64,
    commands: Sender<Command>,
    forwarder: JoinHandle<()>,
}

impl PositionSubscription {
    pub async fn cancel(self) {
        self.forwarder.abort();

        let (reply, done) = oneshot::channel();
        let command = Command::Unsubscribe {
            subscription: self.id,
            reply: Some(reply),
        };

        if self.commands.send(command).await.is_ok() {
            let _ = done.await;
        }
    }
}

impl Drop for PositionSubscription {
    fn drop(&mut self) {
        self.forwarder.abort();

        let _ = self.commands.try_send(Command::Unsubscribe {
            subscription: self.id,
            reply: None,
        });
    }
}

struct Actor {
    session: NavigationSession,
    directions: DynDirections,
    events: broadcast::Sender<SessionEvent>,
    resolutions: Sender<Resolution>,
    subscriptions: HashSet<u64>,
}

impl Actor {
    async fn run(mut self, inbox: Receiver<Command>, resolved: Receiver<Resolution>) {
        loop {
            tokio::select! {
                command = inbox.recv() => match command {
                    Ok(command) => self.handle(command),
                    Err(_) => break,
                },
                Ok((token, result)) = resolved.recv() => self.resolve(token, result),
            }
        }

        tracing::debug!("navigator stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Snapshot { reply } => {
                let _ = reply.send(Ok(self.session.snapshot()));
            }
            Command::SelectDestination { place, reply } => {
                let result = self
                    .session
                    .select_destination(place)
                    .map(|request| self.dispatch(request));
                self.respond(reply, result);
            }
            Command::ChangeTravelMode { mode, reply } => {
                let result = self
                    .session
                    .change_travel_mode(mode)
                    .map(|request| self.dispatch(request));
                self.respond(reply, result);
            }
            Command::Start { reply } => {
                let result = self.session.start();
                self.respond(reply, result);
            }
            Command::Stop { reply } => {
                let result = self.session.stop();
                self.respond(reply, result);
            }
            Command::ClearDestination { reply } => {
                self.session.clear_destination();
                self.respond(reply, Ok(()));
            }
            Command::SetSpeedLimit {
                speed_limit_kmh,
                reply,
            } => {
                let result = self.session.set_speed_limit(speed_limit_kmh);
                self.respond(reply, result);
            }
            Command::Position {
                sample,
                subscription,
                reply,
            } => {
                if let Some(id) = subscription {
                    if !self.subscriptions.contains(&id) {
                        return;
                    }
                }

                self.session.on_position_sample(sample);

                match reply {
                    Some(reply) => self.respond(reply, Ok(())),
                    None => self.publish(),
                }
            }
            Command::Subscribe { subscription } => {
                self.subscriptions.insert(subscription);
            }
            Command::Unsubscribe {
                subscription,
                reply,
            } => {
                self.subscriptions.remove(&subscription);

                if let Some(reply) = reply {
                    let _ = reply.send(());
                }
            }
        }
    }

    fn resolve(&mut self, token: RequestToken, result: Result<Option<Route>, Error>) {
        match self.session.apply_route(token, result) {
            Ok(RouteOutcome::Applied) => self.publish(),
            Ok(RouteOutcome::Stale) => (),
            Err(error) => {
                let _ = self
                    .events
                    .send(SessionEvent::RouteFetchFailed { token, error });
                self.publish();
            }
        }
    }

    fn dispatch(&self, request: RouteRequest) {
        let directions = self.directions.clone();
        let resolutions = self.resolutions.clone();

        tokio::spawn(async move {
            let result = match request.origin {
                Some(origin) => {
                    directions
                        .get_route(origin, request.destination, request.mode)
                        .await
                }
                None => {
                    tracing::warn!("no known position to route from");
                    Err(fetch_failed_error())
                }
            };

            let _ = resolutions.send((request.token, result)).await;
        });
    }

    fn respond(&self, reply: Reply, result: Result<(), Error>) {
        let result = result.map(|_| {
            self.publish();
            self.session.snapshot()
        });

        let _ = reply.send(result);
    }

    fn publish(&self) {
        let _ = self
            .events
            .send(SessionEvent::Changed(self.session.snapshot()));
    }
}
