//! Smoke tests for the production runtime: real threads, real tokio timers.

use crossbeam::channel::{unbounded, Sender};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use teleport_core::{ConfigSource, ConfigValue, Event, Host, Presence, StaticConfig};
use teleport_types::{ActorId, Location, Notice, RequestKind, RequestOutcome, Role, WorldId};

/// Host that records side effects and signals moves through a channel so
/// tests can wait on them without sleeping blind.
struct ChannelHost {
    actors: Mutex<HashMap<ActorId, Location>>,
    moves_tx: Sender<(ActorId, Location)>,
    notices: Mutex<Vec<(ActorId, Notice)>>,
}

impl Presence for ChannelHost {
    fn is_connected(&self, actor: ActorId) -> bool {
        self.actors.lock().unwrap().contains_key(&actor)
    }

    fn location_of(&self, actor: ActorId) -> Option<Location> {
        self.actors.lock().unwrap().get(&actor).copied()
    }
}

impl Host for ChannelHost {
    fn move_actor(&self, actor: ActorId, destination: Location) {
        self.actors.lock().unwrap().insert(actor, destination);
        let _ = self.moves_tx.send((actor, destination));
    }

    fn apply_impairment(&self, _actor: ActorId, _duration: Duration) {}

    fn deliver(&self, actor: ActorId, notice: Notice) {
        self.notices.lock().unwrap().push((actor, notice));
    }
}

fn harness() -> (
    Arc<ChannelHost>,
    crossbeam::channel::Receiver<(ActorId, Location)>,
    ActorId,
    ActorId,
    WorldId,
) {
    let world = WorldId::random();
    let a = ActorId::random();
    let b = ActorId::random();
    let mut actors = HashMap::new();
    actors.insert(a, Location::new(world, 0.0, 64.0, 0.0));
    actors.insert(b, Location::new(world, 25.0, 64.0, 0.0));

    let (moves_tx, moves_rx) = unbounded();
    let host = Arc::new(ChannelHost {
        actors: Mutex::new(actors),
        moves_tx,
        notices: Mutex::new(Vec::new()),
    });
    (host, moves_rx, a, b, world)
}

#[test]
fn accepted_request_moves_the_requester() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let config = Arc::new(StaticConfig::new());
    // Immediate move once accepted; keeps the test fast and deterministic.
    config.set("transfer.delay", ConfigValue::Int(0));
    let (host, moves_rx, a, b, world) = harness();

    let handle = teleport_runtime::spawn(
        Arc::clone(&config) as Arc<dyn ConfigSource>,
        Arc::clone(&host),
        runtime.handle().clone(),
    );

    handle.submit(Event::RequestSubmitted {
        requester: a,
        receiver: b,
        kind: RequestKind::Pull,
    });
    handle.submit(Event::AcceptSubmitted { receiver: b });

    let (mover, destination) = moves_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("accepted request should produce a move");
    assert_eq!(mover, a);
    assert_eq!(destination, Location::new(world, 25.0, 64.0, 0.0));

    handle.shutdown();

    let notices = host.notices.lock().unwrap().clone();
    assert!(notices.contains(&(
        a,
        Notice::Resolved {
            outcome: RequestOutcome::Accepted,
            role: Role::Requester,
            other: b,
        }
    )));
    assert!(notices.contains(&(
        b,
        Notice::Resolved {
            outcome: RequestOutcome::Accepted,
            role: Role::Receiver,
            other: a,
        }
    )));
}

#[test]
fn shutdown_with_a_pending_expiry_timer_neither_hangs_nor_fires() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let config = Arc::new(StaticConfig::new());
    let (host, _moves_rx, a, b, _world) = harness();

    let handle = teleport_runtime::spawn(
        Arc::clone(&config) as Arc<dyn ConfigSource>,
        Arc::clone(&host),
        runtime.handle().clone(),
    );

    handle.submit(Event::RequestSubmitted {
        requester: a,
        receiver: b,
        kind: RequestKind::Pull,
    });
    // The expiry timer is at least 5s out; shutdown must flush it.
    handle.shutdown();

    let notices = host.notices.lock().unwrap().clone();
    let expired = notices
        .iter()
        .filter(|(_, notice)| {
            matches!(
                notice,
                Notice::Resolved {
                    outcome: RequestOutcome::Expired,
                    ..
                }
            )
        })
        .count();
    assert_eq!(expired, 0);
}
