//! Session manager: reconnect with fixed backoff, best-effort publishing.

use crate::session::{ChannelConfig, ChannelSession};
use std::time::Instant;
use tracing::{debug, info, warn};
use trackside_core::Notification;

/// The orchestrator's handle to the notification channel.
///
/// Owns at most one live [`ChannelSession`]. When the session dies (send
/// failure, probe failure, remote close) the next publish tears it down and
/// attempts one reconnect, waiting out whatever remains of the fixed backoff
/// since the previous attempt. There is no retry cap: the scanner is a
/// long-running device and keeps trying for as long as it runs.
pub struct NotificationChannel {
    config: ChannelConfig,
    session: Option<ChannelSession>,
    last_attempt: Option<Instant>,
}

impl NotificationChannel {
    #[must_use]
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            session: None,
            last_attempt: None,
        }
    }

    /// Whether a live session currently exists.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(ChannelSession::is_alive)
    }

    /// Publish one notification, best effort.
    ///
    /// If the channel is down and cannot be reconnected right now, the
    /// message is dropped rather than queued: display state is re-derived
    /// from the next read, so a stale replay would only mislead.
    pub async fn publish(&mut self, notification: &Notification) {
        if !self.ensure_connected().await {
            debug!(state = %notification.state, "Channel down, dropping notification");
            return;
        }

        if let Some(session) = &self.session
            && let Err(e) = session.send(notification).await
        {
            warn!(error = %e, "Publish failed, tearing down session");
            self.teardown().await;
        }
    }

    /// Make sure a live session exists, reconnecting at most once.
    ///
    /// Consecutive attempts are spaced by at least the configured backoff,
    /// waiting out the remainder here if the last attempt was recent.
    async fn ensure_connected(&mut self) -> bool {
        if self.is_connected() {
            return true;
        }
        self.teardown().await;

        if let Some(last) = self.last_attempt {
            let since = last.elapsed();
            if since < self.config.reconnect_backoff {
                tokio::time::sleep(self.config.reconnect_backoff - since).await;
            }
        }

        self.last_attempt = Some(Instant::now());
        match ChannelSession::connect(&self.config).await {
            Ok(session) => {
                info!(url = %self.config.url, "Notification channel connected");
                self.session = Some(session);
                true
            }
            Err(e) => {
                warn!(error = %e, "Channel reconnect failed");
                false
            }
        }
    }

    async fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            session.close().await;
        }
    }
}
