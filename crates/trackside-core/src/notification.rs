//! Notification wire model for the duplex display channel.
//!
//! Every message pushed to the collector is one JSON object:
//! `{"state": "...", "uid": "...", "responseCode": "...", "extras": "..."}`.
//! The constructors below are the only way to build one, so a state can
//! never be paired with an inconsistent payload.

use crate::{
    constants::{EXTRAS_SEPARATOR, LABEL_BEST_LAP, LABEL_LAP_TIME, LABEL_ROUNDS, RESPONSE_CODE_NONE},
    uid::CanonicalUid,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scan cycle state as seen by the display collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TapState {
    Idle,
    Loading,
    Success,
    Error,
}

impl fmt::Display for TapState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TapState::Idle => write!(f, "idle"),
            TapState::Loading => write!(f, "loading"),
            TapState::Success => write!(f, "success"),
            TapState::Error => write!(f, "error"),
        }
    }
}

/// One message on the notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub state: TapState,
    pub uid: String,
    pub response_code: String,
    pub extras: String,
}

impl Notification {
    /// Idle: no new tag since the last processed one.
    #[must_use]
    pub fn idle() -> Self {
        Notification {
            state: TapState::Idle,
            uid: String::new(),
            response_code: RESPONSE_CODE_NONE.to_string(),
            extras: String::new(),
        }
    }

    /// Loading: a confirmation for `uid` is about to be sent.
    #[must_use]
    pub fn loading(uid: &CanonicalUid) -> Self {
        Notification {
            state: TapState::Loading,
            uid: uid.to_string(),
            response_code: RESPONSE_CODE_NONE.to_string(),
            extras: String::new(),
        }
    }

    /// Success: the round was confirmed; `extras` carries the display fields.
    #[must_use]
    pub fn success(uid: &CanonicalUid, extras: String) -> Self {
        Notification {
            state: TapState::Success,
            uid: uid.to_string(),
            response_code: "200".to_string(),
            extras,
        }
    }

    /// Error: confirmation or lookup failed.
    ///
    /// `response_code` is the HTTP status, or the `"-1"` sentinel for
    /// transport-level failures.
    #[must_use]
    pub fn error(uid: &CanonicalUid, response_code: &str, message: &str) -> Self {
        Notification {
            state: TapState::Error,
            uid: uid.to_string(),
            response_code: response_code.to_string(),
            extras: message.to_string(),
        }
    }
}

/// Rider profile returned by the lookup endpoint.
///
/// All fields are optional on the wire; missing values render as empty
/// display fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LapProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub round_count: Option<String>,
    pub lap_time: Option<String>,
    pub fastest_lap: Option<String>,
}

impl LapProfile {
    /// Render the pipe-delimited `extras` display string.
    ///
    /// Layout: `name|Runde:|count|Zeit:|lap|Bestzeit:|fastest`. The pipe is
    /// a separator by convention and is never escaped.
    #[must_use]
    pub fn extras(&self) -> String {
        let field = |v: &Option<String>| v.clone().unwrap_or_default();
        let name = format!("{} {}", field(&self.first_name), field(&self.last_name));
        [
            name.trim().to_string(),
            LABEL_ROUNDS.to_string(),
            field(&self.round_count),
            LABEL_LAP_TIME.to_string(),
            field(&self.lap_time),
            LABEL_BEST_LAP.to_string(),
            field(&self.fastest_lap),
        ]
        .join(&EXTRAS_SEPARATOR.to_string())
    }
}
