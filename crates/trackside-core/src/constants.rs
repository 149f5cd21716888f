//! Shared constants for the trackside lap scanner.
//!
//! Constants are grouped by concern: the canonical UID wire format, the
//! notification payload conventions, and default timing parameters used by
//! the agent when the configuration does not override them.

// ============================================================================
// Canonical UID Format
// ============================================================================

/// Fixed prefix byte prepended to every canonical UID.
///
/// The canonical identifier is `prefix + 3 tag bytes + BCC`, rendered as
/// uppercase hex.
pub const UID_PREFIX_BYTE: u8 = 0x88;

/// Number of raw tag bytes carried in the canonical UID.
pub const UID_TAG_BYTES: usize = 3;

/// Total length of a canonical UID string in hex characters.
///
/// Five bytes (prefix, three tag bytes, checksum) at two characters each.
pub const UID_HEX_LENGTH: usize = 10;

// ============================================================================
// Notification Payload
// ============================================================================

/// Sentinel response code for notifications without an HTTP status.
///
/// Used for idle/loading notifications and for transport-level failures
/// where no server status exists.
pub const RESPONSE_CODE_NONE: &str = "-1";

/// Field separator inside the `extras` display string.
///
/// Separator by convention only; fields are never escaped.
pub const EXTRAS_SEPARATOR: char = '|';

/// Display label preceding the round count in `extras`.
pub const LABEL_ROUNDS: &str = "Runde:";

/// Display label preceding the last lap time in `extras`.
pub const LABEL_LAP_TIME: &str = "Zeit:";

/// Display label preceding the best lap time in `extras`.
pub const LABEL_BEST_LAP: &str = "Bestzeit:";

// ============================================================================
// Default Timing Parameters (milliseconds unless noted)
// ============================================================================

/// Default timeout for each HTTP call to the lap-tracking service.
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 3000;

/// Default timeout for the WebSocket handshake.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3000;

/// Default timeout for a single channel send.
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 2000;

/// Default interval between keepalive probes (seconds).
pub const DEFAULT_PING_INTERVAL_SECS: u64 = 15;

/// Default bounded wait for a pong after a keepalive probe.
pub const DEFAULT_PONG_TIMEOUT_MS: u64 = 5000;

/// Default minimum delay between reconnect attempts.
///
/// Fixed backoff, no exponential growth: the scanner is a long-running
/// device expected to regain connectivity eventually.
pub const DEFAULT_RECONNECT_BACKOFF_MS: u64 = 5000;

/// Default delay between main-loop iterations.
pub const DEFAULT_ITERATION_DELAY_MS: u64 = 1000;

/// Default pause after an invalid or absent read.
///
/// Prevents busy-spinning against a card-absent reader.
pub const DEFAULT_SKIP_PAUSE_MS: u64 = 500;

/// Default pause after an unhandled fault inside one loop iteration.
pub const DEFAULT_RECOVERY_PAUSE_MS: u64 = 1000;
