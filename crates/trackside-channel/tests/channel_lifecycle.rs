//! Integration tests for the notification channel.
//!
//! Each test spawns a throwaway WebSocket listener and drives the channel
//! against it, covering delivery, keepalive death, and reconnect backoff.

use futures_util::StreamExt;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use trackside_channel::{ChannelConfig, ChannelSession, NotificationChannel};
use trackside_core::{CanonicalUid, Notification, RawRead};

fn uid() -> CanonicalUid {
    CanonicalUid::from_raw(RawRead::new(0x1A2B3C)).unwrap()
}

fn fast_config(addr: SocketAddr) -> ChannelConfig {
    ChannelConfig {
        url: format!("ws://{addr}"),
        connect_timeout: Duration::from_millis(1000),
        send_timeout: Duration::from_millis(500),
        ping_interval: Duration::from_millis(100),
        pong_timeout: Duration::from_millis(200),
        reconnect_backoff: Duration::from_millis(300),
    }
}

/// Accept one connection and forward its text frames to the returned channel.
/// Reading the stream also lets tungstenite answer pings automatically.
async fn collector_server() -> (SocketAddr, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            if let WsMessage::Text(text) = msg {
                let _ = tx.send(text.to_string());
            }
        }
    });

    (addr, rx)
}

#[tokio::test]
async fn test_publish_delivers_json() {
    let (addr, mut rx) = collector_server().await;
    let mut channel = NotificationChannel::new(fast_config(addr));

    channel.publish(&Notification::loading(&uid())).await;
    assert!(channel.is_connected());

    let raw = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["state"], "loading");
    assert_eq!(value["uid"], "881A2B3C85");
    assert_eq!(value["responseCode"], "-1");
}

#[tokio::test]
async fn test_session_answers_probes_while_server_reads() {
    let (addr, _rx) = collector_server().await;
    let session = ChannelSession::connect(&fast_config(addr)).await.unwrap();

    // Several ping intervals pass; the reading server pongs, so the
    // session stays alive.
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert!(session.is_alive());
}

#[tokio::test]
async fn test_prompt_pongs_keep_probe_period_at_interval() {
    // Count the pings arriving at a collector that answers promptly.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            if let WsMessage::Ping(_) = msg {
                let _ = tx.send(());
            }
        }
    });

    // Long pong timeout: were the probe period interval + timeout, at most
    // one ping could arrive within the observation window.
    let config = ChannelConfig {
        pong_timeout: Duration::from_secs(5),
        ping_interval: Duration::from_millis(150),
        ..fast_config(addr)
    };
    let session = ChannelSession::connect(&config).await.unwrap();

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert!(session.is_alive());

    let mut pings = 0;
    while rx.try_recv().is_ok() {
        pings += 1;
    }
    assert!(pings >= 3, "expected probes every interval, saw {pings}");
}

#[tokio::test]
async fn test_missing_pongs_kill_the_session() {
    // Accept the handshake, then hold the socket without ever reading:
    // pings are never answered.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let _ws = accept_async(stream).await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let session = ChannelSession::connect(&fast_config(addr)).await.unwrap();
    assert!(session.is_alive());

    // One interval + one bounded pong wait, with slack.
    tokio::time::sleep(Duration::from_millis(800)).await;
    assert!(!session.is_alive());
}

#[tokio::test]
async fn test_remote_close_marks_session_dead() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = accept_async(stream).await.unwrap();
        drop(ws);
    });

    let session = ChannelSession::connect(&fast_config(addr)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!session.is_alive());
}

#[tokio::test]
async fn test_reconnect_attempts_respect_backoff() {
    // Nothing listening: every connect attempt fails fast.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = fast_config(addr);
    let backoff = config.reconnect_backoff;
    let mut channel = NotificationChannel::new(config);

    // First attempt is immediate and fails; the message is dropped.
    channel.publish(&Notification::idle()).await;
    assert!(!channel.is_connected());

    // Second attempt must wait out the fixed backoff.
    let start = Instant::now();
    channel.publish(&Notification::idle()).await;
    assert!(
        start.elapsed() >= backoff - Duration::from_millis(20),
        "second attempt ran after {:?}, backoff is {:?}",
        start.elapsed(),
        backoff
    );
}

#[tokio::test]
async fn test_publish_recovers_after_collector_restart() {
    // First collector accepts one connection, receives one message, dies.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let _ = ws.next().await;
        drop(ws);
        // Release the port before the restarted collector rebinds it.
        drop(listener);

        // Collector comes back on the same port.
        let listener = TcpListener::bind(addr).await.unwrap();
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let mut channel = NotificationChannel::new(fast_config(addr));
    channel.publish(&Notification::idle()).await;
    assert!(channel.is_connected());

    // Wait until the keepalive notices the dead peer, then publish again:
    // the manager reconnects to the restarted collector.
    tokio::time::sleep(Duration::from_millis(800)).await;
    channel.publish(&Notification::idle()).await;
    channel.publish(&Notification::idle()).await;
    assert!(channel.is_connected());
}
