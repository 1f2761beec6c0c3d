//! Timer scheduling abstraction.
//!
//! The state machine emits [`Action::SetTimer`](crate::Action::SetTimer) and
//! [`Action::CancelTimer`](crate::Action::CancelTimer). The runtime side is
//! abstracted behind those actions:
//! - Production: `TimerManager` spawns tokio sleep tasks
//! - Simulation: inserts into a deterministic event queue
//!
//! Every live timer is owned 1:1 by the entity encoded in its id, so
//! cancellation never needs a separate handle registry inside the core.

use crate::Event;
use teleport_types::{ActorId, TransferId};

/// Timer identification for scheduled events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Expiry of the pending request held by this receiver.
    RequestExpiry(ActorId),
    /// Completion of a post-acceptance or return delay window.
    TransferDelay(TransferId),
    /// Retention limit of this actor's remembered position.
    ReturnForget(ActorId),
}

impl TimerId {
    /// The event a runner delivers when this timer fires.
    pub fn into_event(self) -> Event {
        match self {
            TimerId::RequestExpiry(receiver) => Event::RequestExpiry { receiver },
            TimerId::TransferDelay(transfer) => Event::TransferDelayElapsed { transfer },
            TimerId::ReturnForget(actor) => Event::ReturnForget { actor },
        }
    }
}
