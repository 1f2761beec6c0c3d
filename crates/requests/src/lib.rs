//! Request Ledger: the pairwise request state machine.
//!
//! Tracks who requested whom, per-requester cooldowns, and the expiry timer
//! owned by each pending request. Every slot moves through
//! `ABSENT -> PENDING -> {accepted, denied, canceled, expired} -> ABSENT`,
//! and the first transition out of `PENDING` wins; late timer callbacks and
//! duplicate user actions observe an absent slot and no-op.

mod config;
mod state;

pub use config::RequestSettings;
pub use state::{ConflictError, RequestLedger, ResolvedRequest};
