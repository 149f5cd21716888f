//! Trackside agent: configuration and the scan orchestrator.
//!
//! The binary in `main.rs` wires a reader, the lap client, and the
//! notification channel into the [`orchestrator::Orchestrator`] loop.

pub mod config;
pub mod orchestrator;

pub use config::{Settings, load_config};
pub use orchestrator::{LoopTiming, Orchestrator};
