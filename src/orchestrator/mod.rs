//! Application-level orchestration.
//!
//! This module owns the session task: it applies UI commands to the session
//! controller, runs pool fetches concurrently, and emits events for
//! presentation layers. UI/CLI layers call into this module to keep
//! responsibilities separated.

mod controller;

pub use controller::{run_controller, UiCommand};
