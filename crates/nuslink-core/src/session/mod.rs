//! Session state machine
//!
//! - `state`: the state owned by the session and the snapshot published from it
//! - `reducer`: the single entry point for state transitions
//! - `task`: the task that owns the session's resources and drives the reducer

pub mod reducer;
pub mod state;
pub mod task;

pub use reducer::{reduce, Action};
pub use state::{ClientSnapshot, SessionState};
pub use task::{Command, SessionTask, MANUAL_ENABLE_HINT};
