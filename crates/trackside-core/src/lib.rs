//! Core types shared across the trackside workspace.
//!
//! This crate holds the pure, I/O-free pieces of the lap scanner: the
//! canonical tag identifier and its checksum derivation, the per-session
//! debounce state machine, and the notification wire model pushed to the
//! display collector.

pub mod constants;
pub mod error;
pub mod notification;
pub mod session;
pub mod uid;

pub use error::{Error, Result};
pub use notification::{LapProfile, Notification, TapState};
pub use session::{PollDecision, SessionState};
pub use uid::{CanonicalUid, RawRead};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
