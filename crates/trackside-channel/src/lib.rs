//! Duplex notification channel to the display collector.
//!
//! Two layers, mirroring the lifecycle in the session state machine
//! `Disconnected → Connecting → Connected → (Disconnected on failure)`:
//!
//! - [`ChannelSession`]: exactly one WebSocket connection with its keepalive
//!   prober. Created connected, marked dead on the first send failure, probe
//!   failure, or remote close — the liveness flag is one-way per session.
//! - [`NotificationChannel`]: the manager the orchestrator talks to. Owns the
//!   current session (if any) and reconnects with a fixed minimum backoff
//!   between attempts, indefinitely. Publishing on a dead channel drops the
//!   message: every state is re-derivable from the next read, so queueing
//!   would only replay stale display states.

mod manager;
mod session;

pub use manager::NotificationChannel;
pub use session::{ChannelConfig, ChannelError, ChannelSession};
