//! Location Memory: one remembered "return point" per actor.
//!
//! Logically independent from the request ledger but under the same
//! lifecycle discipline: every live point owns exactly one forget timer,
//! consumption is read-then-clear-then-act, and the timer path is an
//! idempotent no-op when it loses the race against consumption.

mod config;
mod memory;

pub use config::RecallSettings;
pub use memory::LocationMemory;
