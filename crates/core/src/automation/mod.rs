//! Automation runner supervision.
//!
//! Owns at most one external automation process at a time (recording or
//! playing, never both), resolves which concrete runtime to invoke,
//! classifies the runner's stdout into typed events, and signals the
//! runner back through the sentinel files it polls.

pub mod controller;
pub mod error;
pub mod runtime;
pub mod sentinel;
pub mod store;

pub use controller::{AutomationController, ControllerEvent, STOP_GRACE};
pub use error::AutomationError;
pub use runtime::{resolve_runtime, ResolvedRuntime};
pub use store::ScriptStore;
