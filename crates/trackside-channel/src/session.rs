//! One WebSocket session: connect, serialized sends, keepalive, teardown.

use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{Bytes, Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use trackside_core::Notification;
use trackside_core::constants::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_PING_INTERVAL_SECS, DEFAULT_PONG_TIMEOUT_MS,
    DEFAULT_RECONNECT_BACKOFF_MS, DEFAULT_SEND_TIMEOUT_MS,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, WsMessage>;

/// How often the keepalive checks for the answering pong within its
/// bounded wait.
const PONG_POLL_STEP: Duration = Duration::from_millis(25);

/// Configuration for the notification channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Collector endpoint, e.g. `ws://192.168.0.20:8765`.
    pub url: String,

    /// Timeout for the WebSocket handshake.
    pub connect_timeout: Duration,

    /// Timeout for a single outbound send.
    pub send_timeout: Duration,

    /// Interval between keepalive probes.
    pub ping_interval: Duration,

    /// Bounded wait for the pong answering a probe.
    pub pong_timeout: Duration,

    /// Fixed minimum delay between reconnect attempts.
    pub reconnect_backoff: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8765".to_string(),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            send_timeout: Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS),
            ping_interval: Duration::from_secs(DEFAULT_PING_INTERVAL_SECS),
            pong_timeout: Duration::from_millis(DEFAULT_PONG_TIMEOUT_MS),
            reconnect_backoff: Duration::from_millis(DEFAULT_RECONNECT_BACKOFF_MS),
        }
    }
}

/// Errors that can occur during channel operations.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Handshake did not complete in time.
    #[error("Connect timeout after {0}ms")]
    ConnectTimeout(u64),

    /// Send did not complete in time.
    #[error("Send timeout after {0}ms")]
    SendTimeout(u64),

    /// Session was already marked dead.
    #[error("Channel session is dead")]
    SessionDead,

    /// WebSocket-level error from the transport.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Notification could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One live connection to the collector.
///
/// Spawns two sub-tasks: a reader that watches for pongs and remote close,
/// and a keepalive prober on a fixed interval. Both communicate with the
/// send side through a liveness flag that is set to dead at most once and
/// never reset; a dead session is torn down and replaced, never revived.
pub struct ChannelSession {
    sink: Arc<Mutex<WsSink>>,
    alive: Arc<AtomicBool>,
    send_timeout: Duration,
    keepalive: JoinHandle<()>,
    reader: JoinHandle<()>,
}

impl ChannelSession {
    /// Connect to the collector and start the keepalive prober.
    ///
    /// # Errors
    /// Returns an error if the handshake fails or times out.
    pub async fn connect(config: &ChannelConfig) -> Result<Self, ChannelError> {
        info!(url = %config.url, "Connecting notification channel");

        let (ws, _) = timeout(config.connect_timeout, connect_async(config.url.as_str()))
            .await
            .map_err(|_| {
                warn!(
                    "Channel connect timeout after {}ms",
                    config.connect_timeout.as_millis()
                );
                ChannelError::ConnectTimeout(config.connect_timeout.as_millis() as u64)
            })??;

        let (sink, stream) = ws.split();
        let sink = Arc::new(Mutex::new(sink));
        let alive = Arc::new(AtomicBool::new(true));
        let last_pong = Arc::new(StdMutex::new(Instant::now()));

        let reader = tokio::spawn(Self::read_loop(
            stream,
            Arc::clone(&alive),
            Arc::clone(&last_pong),
        ));
        let keepalive = tokio::spawn(Self::keepalive_loop(
            Arc::clone(&sink),
            Arc::clone(&alive),
            last_pong,
            config.ping_interval,
            config.pong_timeout,
        ));

        debug!("Channel session established");
        Ok(Self {
            sink,
            alive,
            send_timeout: config.send_timeout,
            keepalive,
            reader,
        })
    }

    /// Whether the session is still usable.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Send one notification, serialized as a JSON text frame.
    ///
    /// Sends are serialized through the sink lock: one in flight at a time,
    /// no buffering beyond the transport's own.
    ///
    /// # Errors
    /// Returns an error if the session is dead, the send fails, or it times
    /// out. Any send failure marks the session dead.
    pub async fn send(&self, notification: &Notification) -> Result<(), ChannelError> {
        if !self.is_alive() {
            return Err(ChannelError::SessionDead);
        }

        let text = serde_json::to_string(notification)?;
        let send = async {
            let mut sink = self.sink.lock().await;
            sink.send(WsMessage::Text(text.into())).await
        };

        match timeout(self.send_timeout, send).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                warn!(error = %e, "Channel send failed");
                self.alive.store(false, Ordering::Release);
                Err(e.into())
            }
            Err(_) => {
                warn!("Channel send timeout after {}ms", self.send_timeout.as_millis());
                self.alive.store(false, Ordering::Release);
                Err(ChannelError::SendTimeout(self.send_timeout.as_millis() as u64))
            }
        }
    }

    /// Close the session: best-effort close frame, then stop both sub-tasks.
    pub async fn close(self) {
        debug!("Closing channel session");
        let close = async {
            let mut sink = self.sink.lock().await;
            let _ = sink.send(WsMessage::Close(None)).await;
        };
        let _ = timeout(Duration::from_millis(500), close).await;
        // Dropping self aborts the sub-tasks.
    }

    /// Watch the inbound half for pongs and remote close.
    async fn read_loop(
        mut stream: futures_util::stream::SplitStream<WsStream>,
        alive: Arc<AtomicBool>,
        last_pong: Arc<StdMutex<Instant>>,
    ) {
        while let Some(item) = stream.next().await {
            match item {
                Ok(WsMessage::Pong(_)) => {
                    if let Ok(mut at) = last_pong.lock() {
                        *at = Instant::now();
                    }
                }
                Ok(WsMessage::Close(_)) => {
                    info!("Collector closed the channel");
                    break;
                }
                // Inbound payloads are not part of the contract; ignore them.
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Channel read failed");
                    break;
                }
            }
        }
        alive.store(false, Ordering::Release);
    }

    /// Probe liveness on a fixed interval with a bounded pong wait.
    async fn keepalive_loop(
        sink: Arc<Mutex<WsSink>>,
        alive: Arc<AtomicBool>,
        last_pong: Arc<StdMutex<Instant>>,
        ping_interval: Duration,
        pong_timeout: Duration,
    ) {
        loop {
            tokio::time::sleep(ping_interval).await;
            if !alive.load(Ordering::Acquire) {
                break;
            }

            let probe_sent = Instant::now();
            let ping = async {
                let mut sink = sink.lock().await;
                sink.send(WsMessage::Ping(Bytes::from_static(b"ka"))).await
            };
            match timeout(pong_timeout, ping).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(error = %e, "Keepalive probe failed to send");
                    alive.store(false, Ordering::Release);
                    break;
                }
                Err(_) => {
                    warn!("Keepalive probe send timed out");
                    alive.store(false, Ordering::Release);
                    break;
                }
            }

            // Bounded wait, ended early by the answering pong so the probe
            // period stays at the configured interval.
            let deadline = Instant::now() + pong_timeout;
            let mut answered = false;
            loop {
                if last_pong.lock().map(|at| *at >= probe_sent).unwrap_or(false) {
                    answered = true;
                    break;
                }
                if Instant::now() >= deadline {
                    break;
                }
                tokio::time::sleep(PONG_POLL_STEP.min(pong_timeout)).await;
            }
            if !answered {
                warn!(
                    "No pong within {}ms, marking session dead",
                    pong_timeout.as_millis()
                );
                alive.store(false, Ordering::Release);
                break;
            }
        }
    }
}

impl Drop for ChannelSession {
    fn drop(&mut self) {
        self.keepalive.abort();
        self.reader.abort();
    }
}
