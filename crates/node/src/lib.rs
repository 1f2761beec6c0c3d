//! The composed state machine: request ledger + location memory + transfer
//! orchestration behind a single [`StateMachine`](teleport_core::StateMachine)
//! implementation, plus the lifecycle handling (shutdown, disconnect) that
//! ties them together.

mod state;

pub use state::NodeStateMachine;
