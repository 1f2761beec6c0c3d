//! Event types for the deterministic state machine.

use teleport_types::{ActorId, RequestKind, TransferId};

/// Priority levels for event ordering within the same timestamp.
///
/// Events at the same simulation time are processed in priority order.
/// Lower values = higher priority (processed first).
///
/// This preserves causality: consequences of prior processing (disconnect
/// cleanup, shutdown) are handled before scheduled timers, which in turn
/// beat fresh user commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum EventPriority {
    /// Environment signals and lifecycle: consequences, not new input.
    Internal = 0,

    /// Timer events: scheduled by the core itself.
    Timer = 1,

    /// Client events: commands issued by users.
    Client = 2,
}

/// All possible inputs to the state machine.
///
/// Events are **passive data** - they describe something that happened.
/// The state machine processes events and returns actions.
#[derive(Debug, Clone)]
pub enum Event {
    // ═══════════════════════════════════════════════════════════════════════
    // User commands (priority: Client)
    // ═══════════════════════════════════════════════════════════════════════
    /// An actor asked to open a request against another actor.
    ///
    /// The command layer has already parsed the input; the node still runs
    /// the full eligibility chain (connectivity, busy slots, cooldown)
    /// before anything is installed in the ledger.
    RequestSubmitted {
        requester: ActorId,
        receiver: ActorId,
        kind: RequestKind,
    },

    /// The receiver accepted their incoming request.
    AcceptSubmitted { receiver: ActorId },

    /// The receiver denied their incoming request.
    DenySubmitted { receiver: ActorId },

    /// The requester withdrew their outgoing request.
    CancelSubmitted { requester: ActorId },

    /// An actor asked to return to their remembered position.
    ReturnSubmitted { actor: ActorId },

    // ═══════════════════════════════════════════════════════════════════════
    // Timers (priority: Timer)
    // ═══════════════════════════════════════════════════════════════════════
    /// The expiry timer for the receiver's pending request fired.
    RequestExpiry { receiver: ActorId },

    /// The post-acceptance (or return) delay window elapsed.
    TransferDelayElapsed { transfer: TransferId },

    /// The retention timer for an actor's remembered position fired.
    ReturnForget { actor: ActorId },

    // ═══════════════════════════════════════════════════════════════════════
    // Environment + lifecycle (priority: Internal)
    // ═══════════════════════════════════════════════════════════════════════
    /// An actor abruptly left the environment.
    ActorDisconnected { actor: ActorId },

    /// Tear everything down: cancel all timers, clear all state.
    Shutdown,
}

impl Event {
    /// Get the priority for this event type.
    pub fn priority(&self) -> EventPriority {
        match self {
            Event::RequestSubmitted { .. }
            | Event::AcceptSubmitted { .. }
            | Event::DenySubmitted { .. }
            | Event::CancelSubmitted { .. }
            | Event::ReturnSubmitted { .. } => EventPriority::Client,

            Event::RequestExpiry { .. }
            | Event::TransferDelayElapsed { .. }
            | Event::ReturnForget { .. } => EventPriority::Timer,

            Event::ActorDisconnected { .. } | Event::Shutdown => EventPriority::Internal,
        }
    }

    /// Get the event type name for telemetry.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::RequestSubmitted { .. } => "RequestSubmitted",
            Event::AcceptSubmitted { .. } => "AcceptSubmitted",
            Event::DenySubmitted { .. } => "DenySubmitted",
            Event::CancelSubmitted { .. } => "CancelSubmitted",
            Event::ReturnSubmitted { .. } => "ReturnSubmitted",
            Event::RequestExpiry { .. } => "RequestExpiry",
            Event::TransferDelayElapsed { .. } => "TransferDelayElapsed",
            Event::ReturnForget { .. } => "ReturnForget",
            Event::ActorDisconnected { .. } => "ActorDisconnected",
            Event::Shutdown => "Shutdown",
        }
    }
}
