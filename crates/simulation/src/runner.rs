//! Deterministic simulation runner.
//!
//! Drives a [`NodeStateMachine`] from a single ordered event queue under a
//! virtual clock. Timer actions become queue entries; cancellations remove
//! them; everything else executes against the shared [`SimWorld`]. Given the
//! same submissions, produces identical results every run.

use crate::event_queue::EventKey;
use crate::world::SimWorld;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use teleport_core::{Action, ConfigSource, Event, Host, Presence, StateMachine, TimerId};
use teleport_node::NodeStateMachine;
use tracing::{debug, trace};

/// Statistics collected during simulation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulationStats {
    /// Total events processed.
    pub events_processed: u64,
    /// Events processed by priority (indexed by `EventPriority as usize`).
    pub events_by_priority: [u64; 3],
    /// Total actions generated.
    pub actions_generated: u64,
    /// Timers set.
    pub timers_set: u64,
    /// Timers cancelled before firing.
    pub timers_cancelled: u64,
}

/// Deterministic simulation runner.
///
/// Processes events in deterministic order and executes actions. The
/// machine's clock only moves when the queue says so, which makes every
/// timer-versus-action race in the core reproducible.
pub struct SimulationRunner {
    machine: NodeStateMachine,

    /// Shared world the machine observes and the runner mutates.
    world: SimWorld,

    /// Global event queue, ordered deterministically.
    event_queue: BTreeMap<EventKey, Event>,

    /// Sequence counter for deterministic ordering.
    sequence: u64,

    /// Current simulation time.
    now: Duration,

    /// Timer registry for cancellation support.
    /// Maps timer id -> event key for removal.
    timers: HashMap<TimerId, EventKey>,

    /// Statistics.
    stats: SimulationStats,
}

impl SimulationRunner {
    /// Create a runner over a fresh world.
    pub fn new(config: Arc<dyn ConfigSource>) -> Self {
        let world = SimWorld::new();
        let machine = NodeStateMachine::new(config, Arc::new(world.clone()) as Arc<dyn Presence>);
        Self {
            machine,
            world,
            event_queue: BTreeMap::new(),
            sequence: 0,
            now: Duration::ZERO,
            timers: HashMap::new(),
            stats: SimulationStats::default(),
        }
    }

    /// Handle on the shared world for spawning actors and inspecting
    /// captured side effects.
    pub fn world(&self) -> SimWorld {
        self.world.clone()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn stats(&self) -> SimulationStats {
        self.stats
    }

    /// Read-only view of the machine (ledger and memory queries).
    pub fn machine(&self) -> &NodeStateMachine {
        &self.machine
    }

    /// Enqueue an event at the current time. Ordering among simultaneous
    /// events follows [`EventKey`] rules.
    pub fn submit(&mut self, event: Event) {
        self.schedule_event(self.now, event);
    }

    /// Enqueue an event at an absolute time in the future.
    pub fn submit_at(&mut self, time: Duration, event: Event) {
        debug_assert!(time >= self.now, "cannot schedule into the past");
        self.schedule_event(time, event);
    }

    /// Process events until the queue is drained up to `end_time`, then
    /// advance the clock to `end_time`.
    pub fn run_until(&mut self, end_time: Duration) {
        while let Some((&key, _)) = self.event_queue.first_key_value() {
            if key.time > end_time {
                trace!(remaining_events = self.event_queue.len(), "Time limit reached");
                break;
            }

            let (key, event) = self
                .event_queue
                .pop_first()
                .expect("non-empty queue lost its first entry");
            self.now = key.time;

            trace!(time = ?self.now, event = event.type_name(), "Processing event");

            self.stats.events_processed += 1;
            self.stats.events_by_priority[event.priority() as usize] += 1;

            self.machine.set_time(self.now);
            let actions = self.machine.handle(event);
            self.stats.actions_generated += actions.len() as u64;

            for action in actions {
                self.process_action(action);
            }
        }

        // Always advance to end_time, even if we ran out of events, so
        // polling patterns over `now()` cannot loop forever.
        if self.now < end_time {
            self.now = end_time;
        }
    }

    /// Convenience: run for a relative span.
    pub fn run_for(&mut self, span: Duration) {
        self.run_until(self.now + span);
    }

    fn schedule_event(&mut self, time: Duration, event: Event) -> EventKey {
        let key = EventKey {
            time,
            priority: event.priority(),
            sequence: self.sequence,
        };
        self.sequence += 1;
        self.event_queue.insert(key, event);
        key
    }

    fn process_action(&mut self, action: Action) {
        match action {
            Action::SetTimer { id, duration } => {
                // Same-id re-arm replaces the pending entry.
                if let Some(key) = self.timers.remove(&id) {
                    self.event_queue.remove(&key);
                }
                let fire_time = self.now + duration;
                let key = self.schedule_event(fire_time, id.into_event());
                self.timers.insert(id, key);
                self.stats.timers_set += 1;
                debug!(?id, ?fire_time, "Timer set");
            }

            Action::CancelTimer { id } => {
                if let Some(key) = self.timers.remove(&id) {
                    if self.event_queue.remove(&key).is_some() {
                        self.stats.timers_cancelled += 1;
                        debug!(?id, "Timer cancelled");
                    }
                }
            }

            Action::Notify { actor, notice } => {
                self.world.deliver(actor, notice);
            }

            Action::MoveActor { actor, destination } => {
                self.world.move_actor(actor, destination);
            }

            Action::Impair { actor, duration } => {
                self.world.apply_impairment(actor, duration);
            }
        }
    }
}
