//! Event dispatch and outcome-to-notice translation.

use std::sync::Arc;
use std::time::Duration;
use teleport_core::{Action, ConfigSource, Event, Presence, StateMachine};
use teleport_recall::LocationMemory;
use teleport_requests::RequestLedger;
use teleport_transfer::{SettingsProfile, TransferResolution, TransferState};
use teleport_types::{ActorId, Notice, RequestKind, RequestOutcome, Role, TransferId};
use tracing::{error, info};

/// One session's worth of teleport-request state.
///
/// Owns the three components exclusively; nothing outside this machine
/// touches their maps. All events - user commands, timer firings, disconnect
/// signals - are serialized through [`StateMachine::handle`] by the runner,
/// which is the mutual-exclusion scheme protecting every index.
pub struct NodeStateMachine {
    ledger: RequestLedger,
    memory: LocationMemory,
    transfers: TransferState,
    presence: Arc<dyn Presence>,
    now: Duration,
}

impl NodeStateMachine {
    pub fn new(source: Arc<dyn ConfigSource>, presence: Arc<dyn Presence>) -> Self {
        Self {
            ledger: RequestLedger::new(Arc::clone(&source)),
            memory: LocationMemory::new(Arc::clone(&source)),
            transfers: TransferState::new(source, Arc::clone(&presence)),
            presence,
            now: Duration::ZERO,
        }
    }

    /// Read-only view of the request ledger (status queries, embedder UIs).
    pub fn ledger(&self) -> &RequestLedger {
        &self.ledger
    }

    /// Read-only view of the location memory.
    pub fn memory(&self) -> &LocationMemory {
        &self.memory
    }

    /// Number of delay windows currently open.
    pub fn open_transfers(&self) -> usize {
        self.transfers.pending_count()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // User commands
    // ═══════════════════════════════════════════════════════════════════════

    /// Eligibility chain for a new request. Every early exit is a notice to
    /// the requester; only a fully-validated request reaches the ledger.
    fn on_request_submitted(
        &mut self,
        requester: ActorId,
        receiver: ActorId,
        kind: RequestKind,
    ) -> Vec<Action> {
        if !self.presence.is_connected(receiver) {
            return vec![Action::Notify {
                actor: requester,
                notice: Notice::NotConnected { other: receiver },
            }];
        }
        if requester == receiver {
            return vec![Action::Notify {
                actor: requester,
                notice: Notice::RequestYourself,
            }];
        }
        if self.ledger.has_outgoing(requester) {
            return vec![Action::Notify {
                actor: requester,
                notice: Notice::AlreadyRequesting,
            }];
        }
        if self.ledger.has_incoming(requester) {
            return vec![Action::Notify {
                actor: requester,
                notice: Notice::AlreadyRequested,
            }];
        }
        if self.ledger.on_cooldown(requester) {
            return vec![Action::Notify {
                actor: requester,
                notice: Notice::OnCooldown {
                    remaining_secs: self.ledger.cooldown_remaining(requester),
                },
            }];
        }
        if self.ledger.has_incoming(receiver) || self.ledger.has_outgoing(receiver) {
            return vec![Action::Notify {
                actor: requester,
                notice: Notice::OtherBusy { other: receiver },
            }];
        }

        match self.ledger.create(requester, receiver, kind) {
            Ok(mut actions) => {
                actions.push(Action::Notify {
                    actor: requester,
                    notice: Notice::RequestSent {
                        other: receiver,
                        kind,
                    },
                });
                actions.push(Action::Notify {
                    actor: receiver,
                    notice: Notice::RequestReceived {
                        other: requester,
                        kind,
                    },
                });
                actions
            }
            Err(conflict) => {
                // Unreachable when the chain above ran; reaching it means a
                // validation path was skipped. Surface loudly, fail softly.
                error!(
                    requester = %requester,
                    receiver = %receiver,
                    %conflict,
                    "Request creation conflict after validation"
                );
                vec![Action::Notify {
                    actor: requester,
                    notice: Notice::OtherBusy { other: receiver },
                }]
            }
        }
    }

    fn on_accept_submitted(&mut self, receiver: ActorId) -> Vec<Action> {
        let (resolved, mut actions) = self.ledger.accept(receiver);
        let Some(resolved) = resolved else {
            return vec![Action::Notify {
                actor: receiver,
                notice: Notice::NoActiveRequest,
            }];
        };

        actions.push(Action::Notify {
            actor: resolved.receiver,
            notice: Notice::Resolved {
                outcome: RequestOutcome::Accepted,
                role: Role::Receiver,
                other: resolved.requester,
            },
        });
        actions.push(Action::Notify {
            actor: resolved.requester,
            notice: Notice::Resolved {
                outcome: RequestOutcome::Accepted,
                role: Role::Requester,
                other: resolved.receiver,
            },
        });
        // Resolution and movement are decoupled: the orchestrator owns the
        // delay window and may still abandon the move.
        actions.extend(self.transfers.begin_transfer(resolved));
        actions
    }

    fn on_deny_submitted(&mut self, receiver: ActorId) -> Vec<Action> {
        let (resolved, mut actions) = self.ledger.deny(receiver);
        let Some(resolved) = resolved else {
            return vec![Action::Notify {
                actor: receiver,
                notice: Notice::NoActiveRequest,
            }];
        };
        actions.push(Action::Notify {
            actor: resolved.receiver,
            notice: Notice::Resolved {
                outcome: RequestOutcome::Denied,
                role: Role::Receiver,
                other: resolved.requester,
            },
        });
        actions.push(Action::Notify {
            actor: resolved.requester,
            notice: Notice::Resolved {
                outcome: RequestOutcome::Denied,
                role: Role::Requester,
                other: resolved.receiver,
            },
        });
        actions
    }

    fn on_cancel_submitted(&mut self, requester: ActorId) -> Vec<Action> {
        let (resolved, mut actions) = self.ledger.cancel(requester);
        let Some(resolved) = resolved else {
            return vec![Action::Notify {
                actor: requester,
                notice: Notice::NoActiveRequest,
            }];
        };
        actions.push(Action::Notify {
            actor: resolved.receiver,
            notice: Notice::Resolved {
                outcome: RequestOutcome::Canceled,
                role: Role::Receiver,
                other: resolved.requester,
            },
        });
        actions.push(Action::Notify {
            actor: resolved.requester,
            notice: Notice::Resolved {
                outcome: RequestOutcome::Canceled,
                role: Role::Requester,
                other: resolved.receiver,
            },
        });
        actions
    }

    fn on_return_submitted(&mut self, actor: ActorId) -> Vec<Action> {
        let settings = self.memory.settings();
        if !settings.enabled() {
            return vec![Action::Notify {
                actor,
                notice: Notice::ReturnDisabled,
            }];
        }
        let retention_secs = settings.available_for().as_secs();

        let Some(point) = self.memory.recall(actor) else {
            return vec![Action::Notify {
                actor,
                notice: Notice::NoReturnPoint { retention_secs },
            }];
        };

        let mut actions = vec![Action::Notify {
            actor,
            notice: Notice::ReturnStarted,
        }];
        actions.extend(self.transfers.begin_return(actor, point));
        actions
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Timer firings
    // ═══════════════════════════════════════════════════════════════════════

    fn on_request_expiry(&mut self, receiver: ActorId) -> Vec<Action> {
        let (resolved, mut actions) = self.ledger.expire(receiver);
        let Some(resolved) = resolved else {
            // Lost the race against a user action: exactly-once delivery of
            // the terminal outcome is preserved by doing nothing here.
            return actions;
        };
        actions.push(Action::Notify {
            actor: resolved.receiver,
            notice: Notice::Resolved {
                outcome: RequestOutcome::Expired,
                role: Role::Receiver,
                other: resolved.requester,
            },
        });
        actions.push(Action::Notify {
            actor: resolved.requester,
            notice: Notice::Resolved {
                outcome: RequestOutcome::Expired,
                role: Role::Requester,
                other: resolved.receiver,
            },
        });
        actions
    }

    fn on_transfer_delay_elapsed(&mut self, transfer: TransferId) -> Vec<Action> {
        let (resolution, mut actions) = self.transfers.on_delay_elapsed(transfer);
        match resolution {
            TransferResolution::Completed {
                mover,
                destination,
                anchor,
                profile,
                ..
            } => {
                match profile {
                    SettingsProfile::Transfer => {
                        // The spot the mover is leaving becomes their return
                        // point, when remembering is allowed at all.
                        if self.memory.settings().enabled() {
                            if let Some(anchor) = anchor {
                                actions.extend(self.memory.remember(mover, anchor));
                            }
                        }
                    }
                    SettingsProfile::Return => {
                        // Clear before moving so a failed move cannot leave a
                        // reusable point behind.
                        let (_, consume_actions) = self.memory.consume(mover);
                        actions.extend(consume_actions);
                    }
                }
                actions.push(Action::MoveActor {
                    actor: mover,
                    destination,
                });
                actions
            }
            TransferResolution::MovedDuringDelay { mover, other } => {
                actions.push(Action::Notify {
                    actor: mover,
                    notice: Notice::MovedDuringDelay,
                });
                if let Some(other) = other {
                    actions.push(Action::Notify {
                        actor: other,
                        notice: Notice::OtherMoved { other: mover },
                    });
                }
                actions
            }
            TransferResolution::Disconnected { mover, other } => {
                // Notify whichever side is still around.
                if let Some(other) = other {
                    if self.presence.is_connected(mover) {
                        actions.push(Action::Notify {
                            actor: mover,
                            notice: Notice::OtherDisconnected { other },
                        });
                    }
                    if self.presence.is_connected(other) {
                        actions.push(Action::Notify {
                            actor: other,
                            notice: Notice::OtherDisconnected { other: mover },
                        });
                    }
                }
                actions
            }
            TransferResolution::CrossWorldDenied { mover, other } => {
                actions.push(Action::Notify {
                    actor: mover,
                    notice: Notice::CrossWorldDenied,
                });
                if let Some(other) = other {
                    actions.push(Action::Notify {
                        actor: other,
                        notice: Notice::OtherCrossWorldDenied { other: mover },
                    });
                }
                actions
            }
            TransferResolution::Stale => actions,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════════════

    fn on_actor_disconnected(&mut self, actor: ActorId) -> Vec<Action> {
        let (resolved, mut actions) = self.ledger.on_disconnect(actor);
        if let Some(resolved) = resolved {
            let (counterpart, role) = if resolved.requester == actor {
                (resolved.receiver, Role::Receiver)
            } else {
                (resolved.requester, Role::Requester)
            };
            if self.presence.is_connected(counterpart) {
                actions.push(Action::Notify {
                    actor: counterpart,
                    notice: Notice::Resolved {
                        outcome: RequestOutcome::Expired,
                        role,
                        other: actor,
                    },
                });
            }
        }
        // The actor's return point is kept: it stays usable if they
        // reconnect within its retention window. Open delay windows are left
        // to their own fire-time re-validation.
        actions
    }

    fn on_shutdown(&mut self) -> Vec<Action> {
        info!("Shutting down: flushing all timers and state");
        let mut actions = self.ledger.cancel_all();
        actions.extend(self.memory.clear_all());
        actions.extend(self.transfers.cancel_all());
        actions
    }
}

impl StateMachine for NodeStateMachine {
    fn handle(&mut self, event: Event) -> Vec<Action> {
        match event {
            Event::RequestSubmitted {
                requester,
                receiver,
                kind,
            } => self.on_request_submitted(requester, receiver, kind),
            Event::AcceptSubmitted { receiver } => self.on_accept_submitted(receiver),
            Event::DenySubmitted { receiver } => self.on_deny_submitted(receiver),
            Event::CancelSubmitted { requester } => self.on_cancel_submitted(requester),
            Event::ReturnSubmitted { actor } => self.on_return_submitted(actor),
            Event::RequestExpiry { receiver } => self.on_request_expiry(receiver),
            Event::TransferDelayElapsed { transfer } => self.on_transfer_delay_elapsed(transfer),
            Event::ReturnForget { actor } => {
                self.memory.forget(actor);
                vec![]
            }
            Event::ActorDisconnected { actor } => self.on_actor_disconnected(actor),
            Event::Shutdown => self.on_shutdown(),
        }
    }

    fn set_time(&mut self, now: Duration) {
        self.now = now;
        self.ledger.set_time(now);
    }

    fn now(&self) -> Duration {
        self.now
    }
}
