//! Identifier newtypes.

use std::fmt;
use uuid::Uuid;

/// Stable identity of an actor (player, session, bot) in the hosting
/// environment.
///
/// The core never holds references to host-side actor objects; every index is
/// keyed by this id, so an actor disconnecting cannot leave dangling handles
/// behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub Uuid);

impl ActorId {
    /// Generate a fresh random id. Used by tests and the simulation world;
    /// production ids come from the host.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form: first group of the UUID is plenty for log correlation.
        let s = self.0.to_string();
        write!(f, "{}", &s[..8])
    }
}

/// Identity of a world (dimension) an actor can stand in.
///
/// Two locations are only comparable by distance when their worlds match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorldId(pub Uuid);

impl WorldId {
    /// Generate a fresh random world id (tests and simulation).
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0.to_string();
        write!(f, "{}", &s[..8])
    }
}

/// Correlates a scheduled post-acceptance (or return) delay window with the
/// timer that completes it.
///
/// Ids are allocated from a per-machine counter, so a transfer and a return
/// involving the same actor can be in flight at the same time without their
/// timers colliding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransferId(pub u64);

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transfer-{}", self.0)
    }
}
