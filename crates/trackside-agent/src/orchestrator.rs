//! The main scan loop.
//!
//! One iteration: poll the reader, let the session state decide, then
//! confirm and notify as needed, in strict sequence. The loop never runs
//! two confirmations concurrently and never dies: any fault inside an
//! iteration is logged and followed by a short pause.

use std::time::Duration;
use tracing::{debug, info, trace, warn};
use trackside_channel::NotificationChannel;
use trackside_core::{
    CanonicalUid, Notification, PollDecision, Result, SessionState,
    constants::RESPONSE_CODE_NONE,
};
use trackside_lap::{ConfirmOutcome, LapClient, LookupResult};
use trackside_reader::TagReader;

/// Timing parameters for the scan loop.
#[derive(Debug, Clone)]
pub struct LoopTiming {
    /// Delay between iterations.
    pub iteration_delay: Duration,

    /// Extra pause after an invalid or absent read.
    pub skip_pause: Duration,

    /// Pause after an unhandled iteration fault.
    pub recovery_pause: Duration,
}

impl Default for LoopTiming {
    fn default() -> Self {
        use trackside_core::constants::{
            DEFAULT_ITERATION_DELAY_MS, DEFAULT_RECOVERY_PAUSE_MS, DEFAULT_SKIP_PAUSE_MS,
        };
        Self {
            iteration_delay: Duration::from_millis(DEFAULT_ITERATION_DELAY_MS),
            skip_pause: Duration::from_millis(DEFAULT_SKIP_PAUSE_MS),
            recovery_pause: Duration::from_millis(DEFAULT_RECOVERY_PAUSE_MS),
        }
    }
}

/// Wires reader, lap client, and notification channel into the scan cycle.
///
/// Owns the [`SessionState`] exclusively; the channel's keepalive task is
/// the only other activity per session and shares nothing but the liveness
/// flag.
pub struct Orchestrator<R: TagReader> {
    reader: R,
    lap: LapClient,
    channel: NotificationChannel,
    state: SessionState,
    timing: LoopTiming,
}

impl<R: TagReader> Orchestrator<R> {
    pub fn new(
        reader: R,
        lap: LapClient,
        channel: NotificationChannel,
        timing: LoopTiming,
    ) -> Self {
        Self {
            reader,
            lap,
            channel,
            state: SessionState::new(),
            timing,
        }
    }

    /// Run the scan loop until the process is stopped.
    ///
    /// The recovery boundary: an iteration fault is logged once and the loop
    /// continues after a pause. The device must keep scanning.
    pub async fn run(&mut self) {
        info!("Scan loop started");
        loop {
            if let Err(e) = self.iterate().await {
                warn!(error = %e, "Iteration fault, continuing after pause");
                tokio::time::sleep(self.timing.recovery_pause).await;
            }
            tokio::time::sleep(self.timing.iteration_delay).await;
        }
    }

    /// One poll → decision → confirm/notify cycle.
    ///
    /// # Errors
    /// Returns reader device faults; everything below the reader is handled
    /// in place and surfaced as notifications.
    pub async fn iterate(&mut self) -> Result<()> {
        let read = self.reader.poll_tag().await?;
        let (next, decision) = self.state.on_poll(read);
        self.state = next;

        match decision {
            PollDecision::Skip => {
                trace!("No usable read, pausing");
                tokio::time::sleep(self.timing.skip_pause).await;
            }
            PollDecision::Quiet => {}
            PollDecision::NotifyIdle => {
                debug!("Tag unchanged, reporting idle once");
                self.channel.publish(&Notification::idle()).await;
            }
            PollDecision::Process(uid) => {
                info!(%uid, "Processing tag");
                self.channel.publish(&Notification::loading(&uid)).await;

                let outcome = self.lap.confirm_round(&uid).await;
                let (notification, retry) = outcome_notification(&uid, outcome);
                self.state = self.state.after_attempt(retry);

                info!(%uid, state = %notification.state, retry, "Attempt finished");
                self.channel.publish(&notification).await;
            }
        }

        Ok(())
    }

    /// Current debounce state (for tests and diagnostics).
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }
}

/// Map a confirmation outcome to its terminal notification and retry flag.
///
/// Exactly one terminal notification per processed read; only transport
/// failures set the retry flag.
#[must_use]
pub fn outcome_notification(
    uid: &CanonicalUid,
    outcome: ConfirmOutcome,
) -> (Notification, bool) {
    match outcome {
        ConfirmOutcome::Confirmed(LookupResult::Profile(profile)) => {
            (Notification::success(uid, profile.extras()), false)
        }
        ConfirmOutcome::Confirmed(LookupResult::Failed(message)) => {
            (Notification::error(uid, "200", &message), false)
        }
        ConfirmOutcome::UnknownUid => (
            Notification::error(uid, "500", "Karte ist dem Server unbekannt"),
            false,
        ),
        ConfirmOutcome::UnexpectedStatus(code) => (
            Notification::error(
                uid,
                &code.to_string(),
                &format!("Unerwartete Antwort: HTTP {code}"),
            ),
            false,
        ),
        ConfirmOutcome::NetworkError(message) => (
            Notification::error(uid, RESPONSE_CODE_NONE, &message),
            true,
        ),
    }
}
