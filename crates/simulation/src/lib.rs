//! Deterministic simulation of the teleport-request core.
//!
//! Events are processed from a single ordered queue under a virtual clock,
//! so every timer race the design must survive can be reproduced exactly:
//! a timer and a user action landing on the same instant resolve in a fixed
//! priority order, run after run.

mod event_queue;
mod runner;
mod world;

pub use event_queue::EventKey;
pub use runner::{SimulationRunner, SimulationStats};
pub use world::SimWorld;
