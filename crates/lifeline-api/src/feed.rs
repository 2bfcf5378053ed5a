//! Row change feed with auto-reconnect.
//!
//! Connects to the backend's realtime WebSocket endpoint and streams
//! parsed change notifications through a [`tokio::sync::broadcast`]
//! channel. Handles reconnection with exponential backoff + jitter
//! automatically.
//!
//! The feed carries notifications, not state: a consumer reacts to a
//! [`ChangeEvent`] by re-fetching the affected table over REST.
//!
//! # Example
//!
//! ```rust,ignore
//! use lifeline_api::feed::{FeedHandle, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let cancel = CancellationToken::new();
//! let ws_url = Url::parse("wss://backend.example/realtime/v1/changes")?;
//!
//! let handle = FeedHandle::connect(ws_url, ReconnectConfig::default(), cancel.clone())?;
//! let mut rx = handle.subscribe();
//!
//! while let Ok(event) = rx.recv().await {
//!     println!("{} {:?}", event.table, event.action);
//! }
//!
//! handle.shutdown();
//! ```

use std::time::Duration;

use futures_util::StreamExt;
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::rows::Table;

// ── Broadcast channel capacity ───────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 1024;

// ── ChangeEvent ──────────────────────────────────────────────────────

/// What happened to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Insert,
    Update,
    Delete,
}

impl ChangeAction {
    fn from_frame(kind: &str) -> Option<Self> {
        match kind {
            "INSERT" => Some(Self::Insert),
            "UPDATE" => Some(Self::Update),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// A parsed change notification from the backend feed.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub table: Table,
    pub action: ChangeAction,
    /// The affected row id, when the frame carries one.
    pub record_id: Option<String>,
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for feed reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── FeedHandle ───────────────────────────────────────────────────────

/// Handle to a running change-feed stream.
///
/// Subscribe for a broadcast receiver; call
/// [`shutdown`](Self::shutdown) to tear down the background task.
pub struct FeedHandle {
    event_rx: broadcast::Receiver<ChangeEvent>,
    cancel: CancellationToken,
}

impl FeedHandle {
    /// Spawn the reconnection loop against the given WebSocket URL.
    ///
    /// Returns immediately; the first connection attempt happens
    /// asynchronously. Subscribe to start consuming events.
    pub fn connect(
        ws_url: Url,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Result<Self, Error> {
        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            feed_loop(ws_url, event_tx, reconnect, task_cancel).await;
        });

        Ok(Self { event_rx, cancel })
    }

    /// Get a new broadcast receiver for the change stream.
    ///
    /// Multiple consumers can subscribe concurrently. If a consumer falls
    /// behind, it receives [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.event_rx.resubscribe()
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on error, backoff → reconnect.
async fn feed_loop(
    ws_url: Url,
    event_tx: broadcast::Sender<ChangeEvent>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = connect_and_read(&ws_url, &event_tx, &cancel) => {
                match result {
                    // Clean disconnect (server close frame or stream ended).
                    // Reset attempt counter and reconnect immediately.
                    Ok(()) => {
                        tracing::info!("change feed disconnected cleanly, reconnecting");
                        attempt = 0;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "change feed error");

                        if let Some(max) = reconnect.max_retries {
                            if attempt >= max {
                                tracing::error!(
                                    max_retries = max,
                                    "change feed reconnection limit reached, giving up"
                                );
                                break;
                            }
                        }

                        let delay = calculate_backoff(attempt, &reconnect);
                        tracing::info!(
                            delay_ms = delay.as_millis() as u64,
                            attempt,
                            "waiting before reconnect"
                        );

                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => break,
                            _ = tokio::time::sleep(delay) => {}
                        }

                        attempt += 1;
                    }
                }
            }
        }
    }

    tracing::debug!("change feed loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish a single WebSocket connection, read frames until it drops.
async fn connect_and_read(
    url: &Url,
    event_tx: &broadcast::Sender<ChangeEvent>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(url = %url, "connecting to change feed");

    let uri: tungstenite::http::Uri = url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::FeedConnect(e.to_string()))?;

    let request = ClientRequestBuilder::new(uri);
    let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| Error::FeedConnect(e.to_string()))?;

    tracing::info!("change feed connected");

    let (_write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        parse_and_broadcast(&text, event_tx);
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite handles pong replies automatically
                        tracing::trace!("change feed ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        return close_result(frame);
                    }
                    Some(Err(e)) => {
                        return Err(Error::FeedConnect(e.to_string()));
                    }
                    None => {
                        // Stream ended without a close frame
                        tracing::info!("change feed stream ended");
                        return Ok(());
                    }
                    _ => {
                        // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    }
}

/// Map a server close frame to the connection outcome.
///
/// A normal close (or a bare close without a payload) is a clean
/// disconnect and reconnects immediately; any other code is an error
/// and goes through backoff.
fn close_result(frame: Option<CloseFrame>) -> Result<(), Error> {
    match frame {
        Some(cf) if cf.code != CloseCode::Normal => Err(Error::FeedClosed {
            code: cf.code.into(),
            reason: cf.reason.to_string(),
        }),
        Some(cf) => {
            tracing::info!(code = %cf.code, "change feed closed");
            Ok(())
        }
        None => {
            tracing::info!("change feed close frame received (no payload)");
            Ok(())
        }
    }
}

// ── Frame parsing ────────────────────────────────────────────────────

/// Raw frame the backend sends on the change channel.
///
/// Shape: `{ "table": "crews", "type": "UPDATE", "record": { "id": ... } }`.
#[derive(Debug, Deserialize)]
struct FeedFrame {
    table: String,
    #[serde(rename = "type")]
    action: String,
    #[serde(default)]
    record: serde_json::Value,
}

/// Parse a feed text frame and broadcast the change it describes.
///
/// Frames for unknown tables or actions are logged and dropped; the
/// consumer's periodic refresh covers anything we cannot interpret.
fn parse_and_broadcast(text: &str, event_tx: &broadcast::Sender<ChangeEvent>) {
    let frame: FeedFrame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse feed frame");
            return;
        }
    };

    let Some(table) = Table::from_name(&frame.table) else {
        tracing::debug!(table = %frame.table, "feed frame for unknown table");
        return;
    };
    let Some(action) = ChangeAction::from_frame(&frame.action) else {
        tracing::debug!(action = %frame.action, "feed frame with unknown action");
        return;
    };

    let record_id = frame.record["id"].as_str().map(String::from);

    // Ignore send errors -- just means no active subscribers right now
    let _ = event_tx.send(ChangeEvent {
        table,
        action,
        record_id,
    });
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25% to spread out reconnection storms from multiple clients.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(attempt as i32);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number.
    // Not cryptographically random, but good enough for backoff spread.
    let jitter_factor = 1.0 + 0.25 * ((attempt as f64 * 7.3).sin());
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────
