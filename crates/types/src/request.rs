//! Request vocabulary shared by the ledger, the orchestrator, and user
//! feedback.

use crate::ActorId;

/// Which direction an accepted request moves its participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// The requester moves to the receiver's side ("take me to you").
    Pull,
    /// The receiver moves to the requester's side ("come to me").
    Push,
}

impl RequestKind {
    /// The actor that will be moved once the request is accepted.
    ///
    /// This selection is the only place the two command variants differ; the
    /// whole delay/validation path downstream is shared.
    pub fn mover(self, requester: ActorId, receiver: ActorId) -> ActorId {
        match self {
            RequestKind::Pull => requester,
            RequestKind::Push => receiver,
        }
    }

    /// The actor that stays put and serves as the destination.
    pub fn stationary(self, requester: ActorId, receiver: ActorId) -> ActorId {
        match self {
            RequestKind::Pull => receiver,
            RequestKind::Push => requester,
        }
    }
}

/// Terminal outcome of a pending request. Exactly one of these is delivered
/// per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
    Accepted,
    Denied,
    Canceled,
    Expired,
}

/// Which side of a request a notice is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Requester,
    Receiver,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_moves_the_requester() {
        let requester = ActorId::random();
        let receiver = ActorId::random();
        assert_eq!(RequestKind::Pull.mover(requester, receiver), requester);
        assert_eq!(RequestKind::Pull.stationary(requester, receiver), receiver);
    }

    #[test]
    fn push_moves_the_receiver() {
        let requester = ActorId::random();
        let receiver = ActorId::random();
        assert_eq!(RequestKind::Push.mover(requester, receiver), receiver);
        assert_eq!(RequestKind::Push.stationary(requester, receiver), requester);
    }
}
