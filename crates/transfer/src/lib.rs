//! Teleport Orchestrator: the delay window between acceptance and movement.
//!
//! Acceptance resolves a request; it does not move anyone. This crate owns
//! what happens next: capture the mover's anchor, optionally impair their
//! movement, wait out the configured delay, then re-validate everything
//! before committing to the move. The same path drives return trips to a
//! remembered position; only the destination differs.

mod config;
mod state;

pub use config::{SettingsProfile, TransferSettings};
pub use state::{Destination, TransferResolution, TransferState};
