//! Pending delay windows and their fire-time re-validation.

use crate::config::{SettingsProfile, TransferSettings};
use std::collections::HashMap;
use std::sync::Arc;
use teleport_core::{Action, ConfigSource, Presence, TimerId};
use teleport_requests::ResolvedRequest;
use teleport_types::{ActorId, Location, TransferId};
use tracing::{debug, trace};

/// Where a pending transfer is headed.
///
/// Actor destinations are resolved to a concrete location at fire time, so
/// the mover lands where the target *is*, not where they were at acceptance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Destination {
    Actor(ActorId),
    Point(Location),
}

/// A scheduled move waiting out its delay window.
#[derive(Debug, Clone, Copy)]
struct PendingTransfer {
    mover: ActorId,
    /// The stationary counterpart of a request transfer; `None` for returns.
    other: Option<ActorId>,
    destination: Destination,
    /// Where the mover stood when the window opened. `None` when the mover
    /// was already gone at scheduling time.
    anchor: Option<Location>,
    profile: SettingsProfile,
}

/// What a delay window resolved to once its timer fired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransferResolution {
    /// All checks passed; the mover should be moved to `destination`.
    Completed {
        mover: ActorId,
        other: Option<ActorId>,
        destination: Location,
        anchor: Option<Location>,
        profile: SettingsProfile,
    },
    /// The mover left the leeway radius (or their anchor is unknown) while
    /// the stand-still policy is on.
    MovedDuringDelay {
        mover: ActorId,
        other: Option<ActorId>,
    },
    /// A participant vanished during the delay.
    Disconnected {
        mover: ActorId,
        other: Option<ActorId>,
    },
    /// The move would cross worlds and cross-world travel is disabled.
    CrossWorldDenied {
        mover: ActorId,
        other: Option<ActorId>,
    },
    /// The window was already cancelled; late timer, nothing to do.
    Stale,
}

/// The orchestrator state machine.
///
/// Transfer ids come from a per-machine counter, so a request transfer and a
/// return trip for the same actor can wait concurrently without their
/// timers colliding. Policy values are read at fire time where re-reading is
/// meaningful (stand-still, leeway, cross-world) and at schedule time where
/// the value is already committed (delay, freeze).
pub struct TransferState {
    pending: HashMap<TransferId, PendingTransfer>,
    next_id: u64,
    settings: TransferSettings,
    presence: Arc<dyn Presence>,
}

impl TransferState {
    pub fn new(source: Arc<dyn ConfigSource>, presence: Arc<dyn Presence>) -> Self {
        Self {
            pending: HashMap::new(),
            next_id: 0,
            settings: TransferSettings::new(source),
            presence,
        }
    }

    /// Number of delay windows currently open.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Open the delay window for an accepted request.
    ///
    /// The request kind selects the mover; the other party becomes the
    /// destination. This indirection is what lets one code path serve both
    /// command variants.
    pub fn begin_transfer(&mut self, resolved: ResolvedRequest) -> Vec<Action> {
        let mover = resolved.kind.mover(resolved.requester, resolved.receiver);
        let stationary = resolved.kind.stationary(resolved.requester, resolved.receiver);
        self.schedule(
            mover,
            Some(stationary),
            Destination::Actor(stationary),
            SettingsProfile::Transfer,
        )
    }

    /// Open the delay window for a return trip to a remembered position.
    pub fn begin_return(&mut self, actor: ActorId, point: Location) -> Vec<Action> {
        self.schedule(
            actor,
            None,
            Destination::Point(point),
            SettingsProfile::Return,
        )
    }

    fn schedule(
        &mut self,
        mover: ActorId,
        other: Option<ActorId>,
        destination: Destination,
        profile: SettingsProfile,
    ) -> Vec<Action> {
        let id = TransferId(self.next_id);
        self.next_id += 1;

        // Anchor before any delay: the stand-still check compares against
        // where the mover stood when the window opened.
        let anchor = self.presence.location_of(mover);
        let delay = self.settings.delay(profile);

        self.pending.insert(
            id,
            PendingTransfer {
                mover,
                other,
                destination,
                anchor,
                profile,
            },
        );

        debug!(
            transfer = %id,
            mover = %mover,
            ?profile,
            delay_secs = delay.as_secs(),
            anchored = anchor.is_some(),
            "Delay window opened"
        );

        let mut actions = Vec::with_capacity(2);
        if self.settings.freeze(profile) {
            actions.push(Action::Impair {
                actor: mover,
                duration: delay,
            });
        }
        actions.push(Action::SetTimer {
            id: TimerId::TransferDelay(id),
            duration: delay,
        });
        actions
    }

    /// Timer path: the delay window elapsed; decide what the move becomes.
    ///
    /// Validation order matters: presence first (a vanished actor makes
    /// every other check meaningless), then stand-still, then the
    /// cross-world policy against the destination resolved *now*.
    pub fn on_delay_elapsed(&mut self, id: TransferId) -> (TransferResolution, Vec<Action>) {
        let Some(transfer) = self.pending.remove(&id) else {
            trace!(transfer = %id, "Delay fired for cancelled window");
            return (TransferResolution::Stale, vec![]);
        };
        // The fired timer is gone; keep the runner's registry in step.
        let actions = vec![Action::CancelTimer {
            id: TimerId::TransferDelay(id),
        }];

        let PendingTransfer {
            mover,
            other,
            destination,
            anchor,
            profile,
        } = transfer;

        let other_present = other.map_or(true, |o| self.presence.is_connected(o));
        let current = self.presence.location_of(mover);
        let (Some(current), true) = (current, other_present) else {
            debug!(transfer = %id, mover = %mover, "Participant vanished during delay");
            return (TransferResolution::Disconnected { mover, other }, actions);
        };

        if self.settings.must_stand_still(profile) {
            let leeway = self.settings.movement_leeway(profile);
            // A missing anchor or a world change makes the drift unknowable;
            // both count as having moved.
            let held_still = anchor
                .and_then(|a| a.distance_to(&current))
                .is_some_and(|d| d <= leeway);
            if !held_still {
                debug!(transfer = %id, mover = %mover, leeway, "Mover left the leeway radius");
                return (TransferResolution::MovedDuringDelay { mover, other }, actions);
            }
        }

        let destination = match destination {
            Destination::Point(location) => location,
            Destination::Actor(target) => match self.presence.location_of(target) {
                Some(location) => location,
                None => {
                    debug!(transfer = %id, target = %target, "Target vanished during delay");
                    return (TransferResolution::Disconnected { mover, other }, actions);
                }
            },
        };

        if !destination.same_world(&current) && !self.settings.cross_world_allowed() {
            debug!(transfer = %id, mover = %mover, "Cross-world move denied by policy");
            return (TransferResolution::CrossWorldDenied { mover, other }, actions);
        }

        debug!(transfer = %id, mover = %mover, "Delay window completed");
        (
            TransferResolution::Completed {
                mover,
                other,
                destination,
                anchor,
                profile,
            },
            actions,
        )
    }

    /// Cancel every open delay window. Shutdown parity with the ledger's
    /// `cancel_all`.
    pub fn cancel_all(&mut self) -> Vec<Action> {
        let actions: Vec<Action> = self
            .pending
            .keys()
            .map(|&id| Action::CancelTimer {
                id: TimerId::TransferDelay(id),
            })
            .collect();
        if !self.pending.is_empty() {
            debug!(pending = self.pending.len(), "Cancelling open delay windows");
        }
        self.pending.clear();
        actions
    }
}
