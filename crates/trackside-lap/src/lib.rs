//! HTTP client for the lap-tracking service.
//!
//! One call per processed tag: `confirm_round` posts the completed round and,
//! when the server acknowledges it, follows up with a profile lookup for the
//! display fields. The client never retries on its own; it classifies every
//! result into a [`ConfirmOutcome`] and leaves the retry decision to the
//! orchestrator's session state.
//!
//! # Classification
//!
//! - transport failure (refused, timeout, malformed primary response) →
//!   [`ConfirmOutcome::NetworkError`] — the only retry-worthy class,
//! - HTTP 500 → [`ConfirmOutcome::UnknownUid`] — a definitive negative,
//! - HTTP 200 → [`ConfirmOutcome::Confirmed`], carrying the lookup result;
//!   a failed lookup never invalidates the confirmation itself,
//! - anything else → [`ConfirmOutcome::UnexpectedStatus`] — logged anomaly,
//!   not retried, so a persistently misconfigured server cannot drive the
//!   scanner into a tight resubmission loop.

use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use trackside_core::{CanonicalUid, LapProfile};

/// Configuration for the lap API client.
#[derive(Debug, Clone)]
pub struct LapApiConfig {
    /// Base URL of the lap-tracking service, without a trailing slash.
    pub base_url: String,

    /// Timeout applied to every request.
    pub timeout: Duration,
}

impl Default for LapApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout: Duration::from_millis(trackside_core::constants::DEFAULT_HTTP_TIMEOUT_MS),
        }
    }
}

/// Errors raised while constructing the client.
#[derive(Debug, Error)]
pub enum LapClientError {
    #[error("Failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Result of the dependent profile lookup after a confirmed round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    /// Lookup succeeded; profile fields are ready for display.
    Profile(LapProfile),

    /// Lookup failed (transport or malformed body). The round itself
    /// remains confirmed.
    Failed(String),
}

/// Classified result of one confirmation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Round accepted by the server.
    Confirmed(LookupResult),

    /// Server does not know this UID (HTTP 500).
    UnknownUid,

    /// Well-formed response with a status this client does not handle.
    UnexpectedStatus(u16),

    /// Transport-level failure; the attempt may be retried.
    NetworkError(String),
}

#[derive(Serialize)]
struct RoundRequest<'a> {
    uid: &'a str,
}

/// Client for the lap completion and profile lookup endpoints.
#[derive(Debug, Clone)]
pub struct LapClient {
    http: reqwest::Client,
    base_url: String,
}

impl LapClient {
    /// Create a client with per-request timeout enforcement.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: LapApiConfig) -> Result<Self, LapClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Confirm one completed round for `uid`.
    ///
    /// Sends the completion request and classifies the response. On HTTP 200
    /// the dependent profile lookup runs immediately; its failure is folded
    /// into the outcome rather than surfaced as an error.
    pub async fn confirm_round(&self, uid: &CanonicalUid) -> ConfirmOutcome {
        let url = format!("{}/api/rounds", self.base_url);
        debug!(%uid, %url, "Confirming round");

        let response = self
            .http
            .post(&url)
            .json(&RoundRequest { uid: uid.as_str() })
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(%uid, error = %e, "Round confirmation failed at transport level");
                return ConfirmOutcome::NetworkError(e.to_string());
            }
        };

        match response.status() {
            StatusCode::OK => {
                debug!(%uid, "Round confirmed, fetching profile");
                ConfirmOutcome::Confirmed(self.fetch_profile(uid).await)
            }
            StatusCode::INTERNAL_SERVER_ERROR => {
                warn!(%uid, "Server does not know this UID");
                ConfirmOutcome::UnknownUid
            }
            status => {
                warn!(%uid, %status, "Unexpected confirmation status");
                ConfirmOutcome::UnexpectedStatus(status.as_u16())
            }
        }
    }

    /// Fetch the rider profile for a confirmed UID.
    async fn fetch_profile(&self, uid: &CanonicalUid) -> LookupResult {
        let url = format!("{}/api/profile", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("uid", uid.as_str())])
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(%uid, error = %e, "Profile lookup failed at transport level");
                return LookupResult::Failed(format!("Profilabfrage fehlgeschlagen: {e}"));
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(%uid, %status, "Profile lookup returned non-success status");
            return LookupResult::Failed(format!("Profilabfrage fehlgeschlagen: HTTP {status}"));
        }

        match response.json::<LapProfile>().await {
            Ok(profile) => LookupResult::Profile(profile),
            Err(e) => {
                warn!(%uid, error = %e, "Profile response was malformed");
                LookupResult::Failed(format!("Profilabfrage fehlgeschlagen: {e}"))
            }
        }
    }
}
