//! Card drawing sessions: a single-card draw, text-only passages per language,
//! and a six-card divination spread, all driven by one session controller that
//! publishes immutable snapshots to whichever presentation layer is attached.

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod session;
pub mod source;
pub mod text_summary;
#[cfg(feature = "tui")]
pub mod tui;
pub mod view;
