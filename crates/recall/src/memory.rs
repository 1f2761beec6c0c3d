//! Return point storage.

use crate::config::RecallSettings;
use std::collections::HashMap;
use std::sync::Arc;
use teleport_core::{Action, ConfigSource, TimerId};
use teleport_types::{ActorId, Location};
use tracing::{debug, trace};

/// At most one remembered position per actor, each owning a forget timer.
///
/// Mutated only on the thread that owns the composed state machine; the
/// forget timer is expressed as an action keyed by
/// [`TimerId::ReturnForget`], so re-remembering replaces the old timer in
/// the runner and consumption cancels it.
pub struct LocationMemory {
    points: HashMap<ActorId, Location>,
    settings: RecallSettings,
}

impl LocationMemory {
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self {
            points: HashMap::new(),
            settings: RecallSettings::new(source),
        }
    }

    pub fn settings(&self) -> &RecallSettings {
        &self.settings
    }

    /// Whether the actor has a remembered position.
    pub fn has(&self, actor: ActorId) -> bool {
        self.points.contains_key(&actor)
    }

    /// The actor's remembered position, if any. Pure read.
    pub fn recall(&self, actor: ActorId) -> Option<Location> {
        self.points.get(&actor).copied()
    }

    /// Remember a position, overwriting any previous one and re-arming the
    /// forget timer. A zero retention window means "do not remember".
    pub fn remember(&mut self, actor: ActorId, location: Location) -> Vec<Action> {
        let retention = self.settings.available_for();
        if retention.is_zero() {
            trace!(actor = %actor, "Retention disabled, not remembering position");
            return vec![];
        }

        self.points.insert(actor, location);
        debug!(
            actor = %actor,
            world = %location.world,
            retention_secs = retention.as_secs(),
            "Remembered return point"
        );

        // SetTimer replaces an already-pending forget timer for this actor.
        vec![Action::SetTimer {
            id: TimerId::ReturnForget(actor),
            duration: retention,
        }]
    }

    /// Remove and return the actor's point, cancelling its forget timer.
    ///
    /// Called immediately *before* performing a return move: clearing first
    /// means a failed move cannot leave a reusable stale point behind.
    pub fn consume(&mut self, actor: ActorId) -> (Option<Location>, Vec<Action>) {
        match self.points.remove(&actor) {
            Some(location) => {
                debug!(actor = %actor, "Consumed return point");
                (
                    Some(location),
                    vec![Action::CancelTimer {
                        id: TimerId::ReturnForget(actor),
                    }],
                )
            }
            None => (None, vec![]),
        }
    }

    /// Timer path: the retention window lapsed. Idempotent no-op when the
    /// point was already consumed.
    pub fn forget(&mut self, actor: ActorId) -> bool {
        let removed = self.points.remove(&actor).is_some();
        if removed {
            debug!(actor = %actor, "Return point forgotten");
        } else {
            trace!(actor = %actor, "Forget fired for already-consumed point");
        }
        removed
    }

    /// Cancel every forget timer and empty storage. Shutdown parity with the
    /// request ledger's `cancel_all`.
    pub fn clear_all(&mut self) -> Vec<Action> {
        let actions: Vec<Action> = self
            .points
            .keys()
            .map(|&actor| Action::CancelTimer {
                id: TimerId::ReturnForget(actor),
            })
            .collect();
        if !self.points.is_empty() {
            debug!(points = self.points.len(), "Clearing location memory");
        }
        self.points.clear();
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use teleport_core::{ConfigValue, StaticConfig};
    use teleport_types::WorldId;

    fn memory_with(config: StaticConfig) -> LocationMemory {
        LocationMemory::new(Arc::new(config))
    }

    fn point() -> Location {
        Location::new(WorldId::random(), 10.0, 64.0, -3.5)
    }

    #[test]
    fn remember_recall_consume_round_trip() {
        let mut memory = memory_with(StaticConfig::new());
        let actor = ActorId::random();
        let loc = point();

        let actions = memory.remember(actor, loc);
        assert_eq!(
            actions,
            vec![Action::SetTimer {
                id: TimerId::ReturnForget(actor),
                duration: Duration::from_secs(60),
            }]
        );
        assert_eq!(memory.recall(actor), Some(loc));

        let (consumed, actions) = memory.consume(actor);
        assert_eq!(consumed, Some(loc));
        assert_eq!(
            actions,
            vec![Action::CancelTimer {
                id: TimerId::ReturnForget(actor),
            }]
        );
        assert_eq!(memory.recall(actor), None);

        // Second consume observes nothing.
        assert_eq!(memory.consume(actor), (None, vec![]));
    }

    #[test]
    fn zero_retention_means_do_not_remember() {
        let config = StaticConfig::new();
        config.set("return.available_for", ConfigValue::Int(0));
        let mut memory = memory_with(config);
        let actor = ActorId::random();

        assert!(memory.remember(actor, point()).is_empty());
        assert!(!memory.has(actor));
    }

    #[test]
    fn remember_overwrites_and_rearms() {
        let mut memory = memory_with(StaticConfig::new());
        let actor = ActorId::random();
        let first = point();
        let second = point();

        memory.remember(actor, first);
        let actions = memory.remember(actor, second);
        assert_eq!(memory.recall(actor), Some(second));
        // A fresh SetTimer replaces the pending forget timer in the runner.
        assert!(matches!(
            actions.as_slice(),
            [Action::SetTimer {
                id: TimerId::ReturnForget(a),
                ..
            }] if *a == actor
        ));
    }

    #[test]
    fn forget_is_idempotent() {
        let mut memory = memory_with(StaticConfig::new());
        let actor = ActorId::random();
        memory.remember(actor, point());

        assert!(memory.forget(actor));
        assert!(!memory.forget(actor));
        assert_eq!(memory.recall(actor), None);
    }

    #[test]
    fn clear_all_cancels_every_forget_timer() {
        let mut memory = memory_with(StaticConfig::new());
        let (a, b) = (ActorId::random(), ActorId::random());
        memory.remember(a, point());
        memory.remember(b, point());

        let actions = memory.clear_all();
        assert_eq!(actions.len(), 2);
        assert!(actions.iter().all(|action| matches!(
            action,
            Action::CancelTimer {
                id: TimerId::ReturnForget(_)
            }
        )));
        assert!(!memory.has(a));
        assert!(!memory.has(b));
    }
}
