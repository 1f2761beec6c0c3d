//! Core traits: the state machine contract and the environment boundary.

use crate::{Action, Event};
use std::time::Duration;
use teleport_types::{ActorId, Location, Notice};

/// A state machine that processes events.
///
/// # Guarantees
///
/// - **Synchronous**: `handle()` never blocks or awaits
/// - **Deterministic**: given the same state and event, always returns the
///   same actions
/// - **No side effects**: all I/O is performed by the runner via the
///   returned actions; the only reads are through [`Presence`]
pub trait StateMachine {
    /// Process an event, returning actions for the runner to execute.
    fn handle(&mut self, event: Event) -> Vec<Action>;

    /// Set the current time.
    ///
    /// Called by the runner before each `handle()` call with the current
    /// simulation or wall-clock time.
    fn set_time(&mut self, now: Duration);

    /// The time last set via `set_time()`.
    fn now(&self) -> Duration;
}

/// Read-only view of the actors in the hosting environment.
///
/// Consulted synchronously by the state machine (connectivity re-validation,
/// anchor capture). Implementations must be cheap; they are called inside
/// event handling.
pub trait Presence: Send + Sync {
    /// Whether the actor is currently present and connected.
    fn is_connected(&self, actor: ActorId) -> bool;

    /// The actor's current location, or `None` when the actor is absent.
    fn location_of(&self, actor: ActorId) -> Option<Location>;
}

/// Full environment surface a runner drives actions against.
///
/// All three methods are fire-and-forget: failures are not reported back,
/// and "no longer connected" is detected through [`Presence`] on the next
/// re-validation instead.
pub trait Host: Presence {
    /// Move an actor to a destination.
    fn move_actor(&self, actor: ActorId, destination: Location);

    /// Apply a temporary movement impairment.
    fn apply_impairment(&self, actor: ActorId, duration: Duration);

    /// Deliver typed feedback to an actor.
    fn deliver(&self, actor: ActorId, notice: Notice);
}
