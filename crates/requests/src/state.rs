//! Pairwise request tracking with mutual-inverse indices.
//!
//! Two maps carry the live requests:
//!
//! 1. `incoming`: receiver -> the request aimed at them
//! 2. `outgoing`: requester -> the receiver they are waiting on
//!
//! The maps are inverses of each other at every observable point; all slot
//! removal funnels through [`RequestLedger::resolve_slot`] so no resolution
//! path can take one entry without the other.

use crate::config::RequestSettings;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use teleport_core::{Action, ConfigSource, TimerId};
use teleport_types::{ActorId, RequestKind};
use thiserror::Error;
use tracing::{debug, error, trace};

/// A live pending request, keyed by its receiver in the `incoming` index.
#[derive(Debug, Clone, Copy)]
struct LiveRequest {
    requester: ActorId,
    kind: RequestKind,
    created_at: Duration,
}

/// The participants of a request that just left the `PENDING` state.
///
/// Returned to the caller so acceptance can schedule the actual movement;
/// the ledger itself never moves anyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub requester: ActorId,
    pub receiver: ActorId,
    pub kind: RequestKind,
}

/// Structural precondition violations in [`RequestLedger::create`].
///
/// The orchestration layer checks eligibility before calling `create`, so
/// hitting one of these means a required check was skipped. The ledger
/// refuses the request and leaves its indices untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConflictError {
    #[error("requester and receiver are the same actor")]
    SelfRequest,
    #[error("requester {0} is already part of a pending request")]
    RequesterBusy(ActorId),
    #[error("receiver {0} is already part of a pending request")]
    ReceiverBusy(ActorId),
}

/// The request ledger state machine.
///
/// All mutating operations run on the single thread that owns the composed
/// state machine, so the mutual-inverse property is never observable
/// mid-update. Timers are expressed as actions; the runner owns the handles,
/// keyed by [`TimerId::RequestExpiry`] so each pending request has exactly
/// one.
pub struct RequestLedger {
    /// receiver -> live request
    incoming: HashMap<ActorId, LiveRequest>,
    /// requester -> receiver (inverse of `incoming`)
    outgoing: HashMap<ActorId, ActorId>,
    /// requester -> instant the cooldown lapses
    cooldowns: HashMap<ActorId, Duration>,
    settings: RequestSettings,
    now: Duration,
}

impl RequestLedger {
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self {
            incoming: HashMap::new(),
            outgoing: HashMap::new(),
            cooldowns: HashMap::new(),
            settings: RequestSettings::new(source),
            now: Duration::ZERO,
        }
    }

    pub fn set_time(&mut self, now: Duration) {
        self.now = now;
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════════

    /// Whether the actor holds an incoming pending request.
    pub fn has_incoming(&self, receiver: ActorId) -> bool {
        self.incoming.contains_key(&receiver)
    }

    /// Whether the actor has an outgoing pending request.
    pub fn has_outgoing(&self, requester: ActorId) -> bool {
        self.outgoing.contains_key(&requester)
    }

    /// Whether the actor's request cooldown is still running.
    pub fn on_cooldown(&self, requester: ActorId) -> bool {
        self.cooldowns
            .get(&requester)
            .is_some_and(|&until| self.now < until)
    }

    /// Remaining cooldown in whole seconds, rounded down, never negative.
    pub fn cooldown_remaining(&self, requester: ActorId) -> u64 {
        self.cooldowns
            .get(&requester)
            .map(|until| until.saturating_sub(self.now).as_secs())
            .unwrap_or(0)
    }

    /// Number of live pending requests.
    pub fn len(&self) -> usize {
        self.incoming.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incoming.is_empty()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Transitions
    // ═══════════════════════════════════════════════════════════════════════

    /// Install a new pending request.
    ///
    /// Structural preconditions (checked defensively; the caller validates
    /// them first): requester != receiver, and neither party is already in a
    /// pending slot on either side. Cooldown eligibility is the caller's
    /// check alone - a new request always re-arms the requester's cooldown.
    ///
    /// On success the returned actions schedule the expiry timer.
    pub fn create(
        &mut self,
        requester: ActorId,
        receiver: ActorId,
        kind: RequestKind,
    ) -> Result<Vec<Action>, ConflictError> {
        if requester == receiver {
            return Err(ConflictError::SelfRequest);
        }
        if self.incoming.contains_key(&requester) || self.outgoing.contains_key(&requester) {
            return Err(ConflictError::RequesterBusy(requester));
        }
        if self.incoming.contains_key(&receiver) || self.outgoing.contains_key(&receiver) {
            return Err(ConflictError::ReceiverBusy(receiver));
        }

        self.incoming.insert(
            receiver,
            LiveRequest {
                requester,
                kind,
                created_at: self.now,
            },
        );
        self.outgoing.insert(requester, receiver);

        // The cooldown outlives the request: it is only ever cleared by time
        // lapse or cancel_all, never by how the request resolves.
        let cooldown = self.settings.cooldown();
        self.cooldowns.insert(requester, self.now + cooldown);

        let timeout = self.settings.timeout();
        debug!(
            requester = %requester,
            receiver = %receiver,
            ?kind,
            timeout_secs = timeout.as_secs(),
            cooldown_secs = cooldown.as_secs(),
            "Request created"
        );

        Ok(vec![Action::SetTimer {
            id: TimerId::RequestExpiry(receiver),
            duration: timeout,
        }])
    }

    /// Accept the receiver's incoming request.
    ///
    /// `None` means no active request - a valid outcome the caller renders
    /// as feedback, not an error.
    pub fn accept(&mut self, receiver: ActorId) -> (Option<ResolvedRequest>, Vec<Action>) {
        match self.resolve_slot(receiver) {
            Some(resolved) => {
                debug!(
                    requester = %resolved.requester,
                    receiver = %resolved.receiver,
                    kind = ?resolved.kind,
                    "Request accepted"
                );
                (
                    Some(resolved),
                    vec![Action::CancelTimer {
                        id: TimerId::RequestExpiry(receiver),
                    }],
                )
            }
            None => (None, vec![]),
        }
    }

    /// Deny the receiver's incoming request.
    pub fn deny(&mut self, receiver: ActorId) -> (Option<ResolvedRequest>, Vec<Action>) {
        match self.resolve_slot(receiver) {
            Some(resolved) => {
                debug!(
                    requester = %resolved.requester,
                    receiver = %resolved.receiver,
                    "Request denied"
                );
                (
                    Some(resolved),
                    vec![Action::CancelTimer {
                        id: TimerId::RequestExpiry(receiver),
                    }],
                )
            }
            None => (None, vec![]),
        }
    }

    /// Withdraw the requester's outgoing request.
    pub fn cancel(&mut self, requester: ActorId) -> (Option<ResolvedRequest>, Vec<Action>) {
        let Some(&receiver) = self.outgoing.get(&requester) else {
            return (None, vec![]);
        };
        let resolved = self
            .resolve_slot(receiver)
            .expect("outgoing entry without matching incoming entry");
        debug!(
            requester = %resolved.requester,
            receiver = %resolved.receiver,
            "Request canceled"
        );
        (
            Some(resolved),
            vec![Action::CancelTimer {
                id: TimerId::RequestExpiry(receiver),
            }],
        )
    }

    /// Timer path: the receiver's pending request timed out.
    ///
    /// Idempotent - when the slot was already resolved by the time the timer
    /// event is processed, this observes `ABSENT` and does nothing. That is
    /// the whole race resolution: first transition wins, second no-ops.
    pub fn expire(&mut self, receiver: ActorId) -> (Option<ResolvedRequest>, Vec<Action>) {
        let age = self
            .incoming
            .get(&receiver)
            .map(|live| self.now.saturating_sub(live.created_at));
        match self.resolve_slot(receiver) {
            Some(resolved) => {
                debug!(
                    requester = %resolved.requester,
                    receiver = %resolved.receiver,
                    age = ?age,
                    "Request expired"
                );
                // The fired timer no longer exists; the cancel keeps the
                // runner's registry in step with the ledger.
                (
                    Some(resolved),
                    vec![Action::CancelTimer {
                        id: TimerId::RequestExpiry(receiver),
                    }],
                )
            }
            None => {
                trace!(receiver = %receiver, "Expiry fired for already-resolved slot");
                (None, vec![])
            }
        }
    }

    /// Best-effort cleanup when an actor abruptly leaves.
    ///
    /// Resolves the pending request the actor participates in (either side)
    /// as if its expiry fired. At most one slot can involve the actor per
    /// side; with caller-validated requests it is exactly one overall.
    pub fn on_disconnect(&mut self, actor: ActorId) -> (Option<ResolvedRequest>, Vec<Action>) {
        let receiver = if self.incoming.contains_key(&actor) {
            Some(actor)
        } else {
            self.outgoing.get(&actor).copied()
        };
        let Some(receiver) = receiver else {
            return (None, vec![]);
        };
        let resolved = self
            .resolve_slot(receiver)
            .expect("disconnect lookup produced an absent slot");
        debug!(
            actor = %actor,
            requester = %resolved.requester,
            receiver = %resolved.receiver,
            "Pending request resolved by disconnect"
        );
        (
            Some(resolved),
            vec![Action::CancelTimer {
                id: TimerId::RequestExpiry(receiver),
            }],
        )
    }

    /// Cancel every live expiry timer and clear all state, cooldowns
    /// included. Used at shutdown.
    ///
    /// Timer events already in flight when this runs observe empty indices
    /// and no-op.
    pub fn cancel_all(&mut self) -> Vec<Action> {
        let actions: Vec<Action> = self
            .incoming
            .keys()
            .map(|&receiver| Action::CancelTimer {
                id: TimerId::RequestExpiry(receiver),
            })
            .collect();

        if !self.incoming.is_empty() || !self.cooldowns.is_empty() {
            debug!(
                pending = self.incoming.len(),
                cooldowns = self.cooldowns.len(),
                "Clearing request ledger"
            );
        }

        self.incoming.clear();
        self.outgoing.clear();
        self.cooldowns.clear();
        actions
    }

    /// The single transition out of `PENDING`: removes both index entries
    /// atomically and hands back the participants.
    ///
    /// Every resolution path (accept, deny, cancel, expire, disconnect) goes
    /// through here, so the indices cannot diverge.
    fn resolve_slot(&mut self, receiver: ActorId) -> Option<ResolvedRequest> {
        let live = self.incoming.remove(&receiver)?;
        let removed = self.outgoing.remove(&live.requester);
        if removed != Some(receiver) {
            // Should be unreachable: resolve_slot is the only removal path.
            error!(
                requester = %live.requester,
                receiver = %receiver,
                "Outgoing index did not mirror incoming index"
            );
        }
        Some(ResolvedRequest {
            requester: live.requester,
            receiver,
            kind: live.kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teleport_core::{ConfigValue, StaticConfig};

    fn new_ledger() -> RequestLedger {
        RequestLedger::new(Arc::new(StaticConfig::new()))
    }

    fn ledger_with(config: StaticConfig) -> RequestLedger {
        RequestLedger::new(Arc::new(config))
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn create_installs_mutual_inverse_entries() {
        let mut ledger = new_ledger();
        let (a, b) = (ActorId::random(), ActorId::random());

        let actions = ledger.create(a, b, RequestKind::Pull).unwrap();
        assert_eq!(
            actions,
            vec![Action::SetTimer {
                id: TimerId::RequestExpiry(b),
                duration: secs(20),
            }]
        );

        assert!(ledger.has_outgoing(a));
        assert!(ledger.has_incoming(b));
        assert_eq!(ledger.outgoing.get(&a), Some(&b));
        assert_eq!(ledger.incoming.get(&b).unwrap().requester, a);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn accept_resolves_the_pair_and_cancels_the_timer() {
        let mut ledger = new_ledger();
        let (a, b) = (ActorId::random(), ActorId::random());
        ledger.create(a, b, RequestKind::Pull).unwrap();

        let (resolved, actions) = ledger.accept(b);
        assert_eq!(
            resolved,
            Some(ResolvedRequest {
                requester: a,
                receiver: b,
                kind: RequestKind::Pull,
            })
        );
        assert_eq!(
            actions,
            vec![Action::CancelTimer {
                id: TimerId::RequestExpiry(b),
            }]
        );
        assert!(!ledger.has_outgoing(a));
        assert!(!ledger.has_incoming(b));
    }

    #[test]
    fn cancel_is_keyed_by_requester() {
        let mut ledger = new_ledger();
        let (a, b) = (ActorId::random(), ActorId::random());
        ledger.create(a, b, RequestKind::Push).unwrap();

        let (resolved, _) = ledger.cancel(a);
        assert_eq!(resolved.unwrap().receiver, b);
        assert!(ledger.is_empty());
        assert!(ledger.outgoing.is_empty());
    }

    #[test]
    fn terminal_transitions_are_idempotent_in_either_order() {
        let (a, b) = (ActorId::random(), ActorId::random());

        // User action first, timer second.
        let mut ledger = new_ledger();
        ledger.create(a, b, RequestKind::Pull).unwrap();
        assert!(ledger.accept(b).0.is_some());
        assert_eq!(ledger.expire(b).0, None);

        // Timer first, user action second.
        let mut ledger = new_ledger();
        ledger.create(a, b, RequestKind::Pull).unwrap();
        assert!(ledger.expire(b).0.is_some());
        assert_eq!(ledger.accept(b).0, None);
        assert_eq!(ledger.deny(b).0, None);
        assert_eq!(ledger.cancel(a).0, None);
    }

    #[test]
    fn cooldown_survives_every_resolution_path() {
        let (a, b) = (ActorId::random(), ActorId::random());

        type Resolve = fn(&mut RequestLedger, ActorId, ActorId) -> Option<ResolvedRequest>;
        let paths: [Resolve; 4] = [
            |l, _a, b| l.accept(b).0,
            |l, _a, b| l.deny(b).0,
            |l, a, _b| l.cancel(a).0,
            |l, _a, b| l.expire(b).0,
        ];

        for resolve in paths {
            let mut ledger = new_ledger();
            ledger.create(a, b, RequestKind::Pull).unwrap();
            assert!(resolve(&mut ledger, a, b).is_some());
            assert!(ledger.on_cooldown(a), "cooldown must outlive the request");
            assert_eq!(ledger.cooldown_remaining(a), 60);
        }
    }

    #[test]
    fn cooldown_lapses_with_time_and_rounds_down() {
        let mut ledger = new_ledger();
        let (a, b) = (ActorId::random(), ActorId::random());
        ledger.create(a, b, RequestKind::Pull).unwrap();

        ledger.set_time(Duration::from_millis(4_500));
        assert!(ledger.on_cooldown(a));
        assert_eq!(ledger.cooldown_remaining(a), 55);

        ledger.set_time(secs(60));
        assert!(!ledger.on_cooldown(a));
        assert_eq!(ledger.cooldown_remaining(a), 0);

        ledger.set_time(secs(120));
        assert_eq!(ledger.cooldown_remaining(a), 0, "never negative");
    }

    #[test]
    fn zero_cooldown_is_immediately_lapsed() {
        let config = StaticConfig::new();
        config.set("request.cooldown", ConfigValue::Int(0));
        let mut ledger = ledger_with(config);
        let (a, b) = (ActorId::random(), ActorId::random());
        ledger.create(a, b, RequestKind::Pull).unwrap();
        assert!(!ledger.on_cooldown(a));
    }

    #[test]
    fn create_rejects_structural_conflicts_without_corrupting_state() {
        let mut ledger = new_ledger();
        let (a, b, c) = (ActorId::random(), ActorId::random(), ActorId::random());

        assert_eq!(
            ledger.create(a, a, RequestKind::Pull),
            Err(ConflictError::SelfRequest)
        );

        ledger.create(a, b, RequestKind::Pull).unwrap();

        // a already requests b: busy on both sides of the existing pair.
        assert_eq!(
            ledger.create(a, c, RequestKind::Pull),
            Err(ConflictError::RequesterBusy(a))
        );
        assert_eq!(
            ledger.create(c, a, RequestKind::Pull),
            Err(ConflictError::ReceiverBusy(a))
        );
        assert_eq!(
            ledger.create(b, c, RequestKind::Pull),
            Err(ConflictError::RequesterBusy(b))
        );
        assert_eq!(
            ledger.create(c, b, RequestKind::Pull),
            Err(ConflictError::ReceiverBusy(b))
        );

        // The original pair is untouched.
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.outgoing.get(&a), Some(&b));
        assert_eq!(ledger.incoming.get(&b).unwrap().requester, a);
    }

    #[test]
    fn disconnect_resolves_from_either_side() {
        let (a, b) = (ActorId::random(), ActorId::random());

        let mut ledger = new_ledger();
        ledger.create(a, b, RequestKind::Pull).unwrap();
        let (resolved, actions) = ledger.on_disconnect(b);
        assert_eq!(resolved.unwrap().requester, a);
        assert_eq!(actions.len(), 1);
        assert!(ledger.is_empty());

        let mut ledger = new_ledger();
        ledger.create(a, b, RequestKind::Pull).unwrap();
        let (resolved, _) = ledger.on_disconnect(a);
        assert_eq!(resolved.unwrap().receiver, b);
        assert!(ledger.is_empty());

        // No pending request: nothing to do.
        let mut ledger = new_ledger();
        assert_eq!(ledger.on_disconnect(a).0, None);
    }

    #[test]
    fn cancel_all_clears_indices_and_cooldowns() {
        let mut ledger = new_ledger();
        let (a, b) = (ActorId::random(), ActorId::random());
        let (c, d) = (ActorId::random(), ActorId::random());
        ledger.create(a, b, RequestKind::Pull).unwrap();
        ledger.create(c, d, RequestKind::Push).unwrap();

        let actions = ledger.cancel_all();
        assert_eq!(actions.len(), 2);
        assert!(actions.iter().all(|action| matches!(
            action,
            Action::CancelTimer {
                id: TimerId::RequestExpiry(_)
            }
        )));

        assert!(ledger.is_empty());
        assert!(!ledger.on_cooldown(a), "cancel_all clears cooldowns too");

        // A timer event that was already in flight observes nothing.
        assert_eq!(ledger.expire(b).0, None);
    }

    #[test]
    fn timeout_and_cooldown_are_read_live() {
        let config = StaticConfig::new();
        config.set("request.timeout", ConfigValue::Int(30));
        let source = Arc::new(config);
        let mut ledger = RequestLedger::new(Arc::clone(&source) as Arc<dyn ConfigSource>);
        let (a, b) = (ActorId::random(), ActorId::random());

        let actions = ledger.create(a, b, RequestKind::Pull).unwrap();
        assert_eq!(
            actions,
            vec![Action::SetTimer {
                id: TimerId::RequestExpiry(b),
                duration: secs(30),
            }]
        );

        ledger.accept(b);
        source.set("request.timeout", ConfigValue::Int(90));
        ledger.set_time(secs(120));
        let actions = ledger.create(b, a, RequestKind::Pull).unwrap();
        assert_eq!(
            actions,
            vec![Action::SetTimer {
                id: TimerId::RequestExpiry(a),
                duration: secs(90),
            }]
        );
    }
}
