//! Core abstractions for the teleport-request state machine.
//!
//! This crate provides the event-driven skeleton everything else plugs into:
//!
//! - [`Event`]: all possible inputs to the state machine
//! - [`Action`]: all possible outputs from the state machine
//! - [`TimerId`]: identities of cancellable scheduled callbacks
//! - [`EventPriority`]: ordering for events at the same timestamp
//! - [`StateMachine`]: the trait the composed node implements
//! - [`Presence`] / [`Host`]: the environment the core consults and drives
//! - [`ConfigSource`]: the live, read-on-use configuration surface
//!
//! # Architecture
//!
//! The state machine is:
//! - **Synchronous**: no async, no `.await`
//! - **Deterministic**: same state + event = same actions
//! - **Pure-ish**: mutates self, but performs no I/O beyond read-only
//!   [`Presence`] queries
//!
//! All timers and side effects are expressed as [`Action`]s executed by a
//! runner: the production runtime spawns tokio sleep tasks, the simulation
//! inserts into a deterministic event queue. Races between a timer firing
//! and a user action are resolved by the state check at the top of each
//! handler, never by assuming a cancellation won.

mod action;
mod config;
mod event;
mod timer;
mod traits;

pub use action::Action;
pub use config::{clamped_float, clamped_secs, flag, ConfigSource, ConfigValue, StaticConfig};
pub use event::{Event, EventPriority};
pub use timer::TimerId;
pub use traits::{Host, Presence, StateMachine};
