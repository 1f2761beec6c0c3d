//! Production runtime for the teleport-request core.
//!
//! Runs the [`NodeStateMachine`](teleport_node::NodeStateMachine) on a
//! dedicated thread fed by crossbeam channels, with tokio-backed timers.
//! Commands and timer firings are serialized through that single thread,
//! which is the mutual-exclusion scheme protecting every index in the core:
//! no lock is ever held across a side effect.

mod event_loop;
mod service;

pub use service::{spawn, ServiceHandle};
