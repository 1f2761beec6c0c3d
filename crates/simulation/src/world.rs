//! In-memory actor world implementing the environment traits.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use teleport_core::{Host, Presence};
use teleport_types::{ActorId, Location, Notice};
use tracing::trace;

#[derive(Debug, Clone, Copy)]
struct ActorState {
    connected: bool,
    location: Location,
}

#[derive(Default)]
struct WorldInner {
    actors: HashMap<ActorId, ActorState>,
    /// Everything delivered to connected actors, in order.
    notices: Vec<(ActorId, Notice)>,
    /// Every executed move, in order.
    moves: Vec<(ActorId, Location)>,
    /// Every applied impairment, in order.
    impairments: Vec<(ActorId, Duration)>,
}

/// Shared simulated world: actor presence, positions, and a capture log of
/// every side effect the core asked for.
///
/// Cheap to clone; all clones view the same world. The runner executes
/// actions against it while tests mutate actors and inspect the logs.
#[derive(Clone, Default)]
pub struct SimWorld {
    inner: Arc<Mutex<WorldInner>>,
}

impl SimWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connected actor at a location, returning its fresh id.
    pub fn spawn(&self, location: Location) -> ActorId {
        let actor = ActorId::random();
        self.inner.lock().expect("world mutex poisoned").actors.insert(
            actor,
            ActorState {
                connected: true,
                location,
            },
        );
        actor
    }

    /// Mark an actor as disconnected. Their last position is retained so a
    /// later reconnect sees them where they left.
    pub fn disconnect(&self, actor: ActorId) {
        if let Some(state) = self
            .inner
            .lock()
            .expect("world mutex poisoned")
            .actors
            .get_mut(&actor)
        {
            state.connected = false;
        }
    }

    /// Reconnect a previously known actor.
    pub fn reconnect(&self, actor: ActorId) {
        if let Some(state) = self
            .inner
            .lock()
            .expect("world mutex poisoned")
            .actors
            .get_mut(&actor)
        {
            state.connected = true;
        }
    }

    /// Teleport-free repositioning, as if the actor walked there.
    pub fn place(&self, actor: ActorId, location: Location) {
        if let Some(state) = self
            .inner
            .lock()
            .expect("world mutex poisoned")
            .actors
            .get_mut(&actor)
        {
            state.location = location;
        }
    }

    /// All notices delivered so far, in delivery order.
    pub fn notices(&self) -> Vec<(ActorId, Notice)> {
        self.inner
            .lock()
            .expect("world mutex poisoned")
            .notices
            .clone()
    }

    /// Notices delivered to one actor, in delivery order.
    pub fn notices_for(&self, actor: ActorId) -> Vec<Notice> {
        self.inner
            .lock()
            .expect("world mutex poisoned")
            .notices
            .iter()
            .filter(|(to, _)| *to == actor)
            .map(|(_, notice)| *notice)
            .collect()
    }

    /// All executed moves, in order.
    pub fn moves(&self) -> Vec<(ActorId, Location)> {
        self.inner
            .lock()
            .expect("world mutex poisoned")
            .moves
            .clone()
    }

    /// All applied impairments, in order.
    pub fn impairments(&self) -> Vec<(ActorId, Duration)> {
        self.inner
            .lock()
            .expect("world mutex poisoned")
            .impairments
            .clone()
    }
}

impl Presence for SimWorld {
    fn is_connected(&self, actor: ActorId) -> bool {
        self.inner
            .lock()
            .expect("world mutex poisoned")
            .actors
            .get(&actor)
            .is_some_and(|state| state.connected)
    }

    fn location_of(&self, actor: ActorId) -> Option<Location> {
        let inner = self.inner.lock().expect("world mutex poisoned");
        let state = inner.actors.get(&actor)?;
        state.connected.then_some(state.location)
    }
}

impl Host for SimWorld {
    fn move_actor(&self, actor: ActorId, destination: Location) {
        let mut inner = self.inner.lock().expect("world mutex poisoned");
        if let Some(state) = inner.actors.get_mut(&actor) {
            if state.connected {
                state.location = destination;
            }
        }
        inner.moves.push((actor, destination));
    }

    fn apply_impairment(&self, actor: ActorId, duration: Duration) {
        self.inner
            .lock()
            .expect("world mutex poisoned")
            .impairments
            .push((actor, duration));
    }

    fn deliver(&self, actor: ActorId, notice: Notice) {
        let mut inner = self.inner.lock().expect("world mutex poisoned");
        let connected = inner
            .actors
            .get(&actor)
            .is_some_and(|state| state.connected);
        if connected {
            inner.notices.push((actor, notice));
        } else {
            // Best effort: feedback for an absent actor is dropped.
            trace!(actor = %actor, ?notice, "Dropped notice for absent actor");
        }
    }
}
