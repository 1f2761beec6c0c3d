//! Typed user-feedback outcomes.
//!
//! The core never renders text, plays sounds, or formats durations; it emits
//! these values and the embedder turns them into whatever its users see.
//! Expected conditions ("no active request", "on cooldown") are notices,
//! not errors.

use crate::{ActorId, RequestKind, RequestOutcome, Role};

/// A piece of feedback addressed to a single actor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notice {
    /// Your request was sent to `other`.
    RequestSent { other: ActorId, kind: RequestKind },
    /// `other` is asking to teleport (or summon you, depending on `kind`).
    RequestReceived { other: ActorId, kind: RequestKind },

    /// A pending request you were part of reached a terminal state.
    /// `role` is your side of it; `other` is the counterpart.
    Resolved {
        outcome: RequestOutcome,
        role: Role,
        other: ActorId,
    },

    /// You tried to act on a request that does not exist (already resolved,
    /// expired, or never created). A valid answer, not a failure.
    NoActiveRequest,
    /// You must wait before sending another request.
    OnCooldown { remaining_secs: u64 },
    /// You already have an outgoing request pending.
    AlreadyRequesting,
    /// You already have an incoming request pending.
    AlreadyRequested,
    /// The counterpart is already part of a pending request.
    OtherBusy { other: ActorId },
    /// The counterpart is not connected.
    NotConnected { other: ActorId },
    /// You cannot send a request to yourself.
    RequestYourself,

    /// You moved outside the allowed leeway during the pre-teleport delay.
    MovedDuringDelay,
    /// The counterpart moved during the delay; the teleport was abandoned.
    OtherMoved { other: ActorId },
    /// The counterpart disconnected during the delay.
    OtherDisconnected { other: ActorId },
    /// The teleport would cross worlds and cross-world travel is disabled.
    CrossWorldDenied,
    /// The counterpart's teleport was blocked by the cross-world policy.
    OtherCrossWorldDenied { other: ActorId },

    /// Your return trip has been scheduled.
    ReturnStarted,
    /// No remembered position to return to. `retention_secs` is how long
    /// positions are kept, for the embedder to explain the window.
    NoReturnPoint { retention_secs: u64 },
    /// The return command is disabled by configuration.
    ReturnDisabled,
}
