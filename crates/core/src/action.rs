//! Action types emitted by the state machine.

use crate::TimerId;
use std::time::Duration;
use teleport_types::{ActorId, Location, Notice};

/// All possible outputs from the state machine.
///
/// Actions are executed by the runner after `handle()` returns, in order.
/// None of them report back synchronously; results that matter re-enter the
/// machine as [`Event`](crate::Event)s (a set timer eventually fires) and
/// everything else is fire-and-forget.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Schedule `id` to fire after `duration`. Setting a timer that is
    /// already pending replaces it (cancel + re-arm).
    SetTimer { id: TimerId, duration: Duration },

    /// Cancel a pending timer. Must be idempotent in every runner: the timer
    /// may already have fired or never have been set.
    CancelTimer { id: TimerId },

    /// Deliver a piece of typed feedback to an actor. Best effort; delivery
    /// to a disconnected actor is silently dropped by the runner.
    Notify { actor: ActorId, notice: Notice },

    /// Move an actor to a destination. Best effort, no return contract.
    MoveActor {
        actor: ActorId,
        destination: Location,
    },

    /// Apply a temporary movement impairment for the delay window.
    /// Best effort, no return contract.
    Impair { actor: ActorId, duration: Duration },
}
