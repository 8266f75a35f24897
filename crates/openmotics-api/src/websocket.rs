//! Websocket event stream with auto-reconnect.
//!
//! Connects to a backend's event websocket and streams parsed events
//! through a [`tokio::sync::broadcast`] channel. Each connection attempt
//! asks the backend for fresh headers, so an expired token is renewed
//! before reconnecting.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use openmotics_api::websocket::{EventStream, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let client = Arc::new(CloudClient::new(token));
//! client.set_installation_id(21);
//!
//! let stream = EventStream::connect(client, ReconnectConfig::default(), CancellationToken::new());
//! let mut rx = stream.subscribe();
//! while let Ok(event) = rx.recv().await {
//!     println!("{:?}", event.event);
//! }
//! stream.shutdown();
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use reqwest::header;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder, Message};
use tokio_tungstenite::Connector;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::backend::Backend;
use crate::error::Error;
use crate::tls;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

// ── GatewayEvent ─────────────────────────────────────────────────────

/// A state change pushed by the gateway or the cloud.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayEvent {
    /// Message type, e.g. `OUTPUT_CHANGE`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    /// The event body. Frames without it are not events.
    pub event: Value,

    #[serde(default)]
    pub data: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for websocket reconnection.
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

// ── EventStream ──────────────────────────────────────────────────────

/// Handle to a running event stream.
pub struct EventStream {
    event_rx: broadcast::Receiver<Arc<GatewayEvent>>,
    cancel: CancellationToken,
}

impl EventStream {
    /// Spawn the connect/read/reconnect loop for `backend`.
    ///
    /// Returns immediately; the first connection happens in the background.
    pub fn connect<B>(backend: Arc<B>, reconnect: ReconnectConfig, cancel: CancellationToken) -> Self
    where
        B: Backend + 'static,
    {
        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            ws_loop(backend, event_tx, reconnect, task_cancel).await;
        });

        Self { event_rx, cancel }
    }

    /// A new receiver. Slow consumers get [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<GatewayEvent>> {
        self.event_rx.resubscribe()
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

async fn ws_loop<B: Backend>(
    backend: Arc<B>,
    event_tx: broadcast::Sender<Arc<GatewayEvent>>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(backend.as_ref(), &event_tx, &cancel) => {
                match result {
                    Ok(()) => {
                        info!("websocket disconnected cleanly, reconnecting");
                        attempt = 0;
                    }
                    Err(e) => {
                        warn!(error = %e, attempt, "websocket error");

                        if let Some(max) = reconnect.max_retries {
                            if attempt >= max {
                                error!(max_retries = max, "websocket reconnection limit reached, giving up");
                                break;
                            }
                        }

                        let delay = calculate_backoff(attempt, &reconnect);
                        info!(delay_ms = delay.as_millis(), attempt, "waiting before reconnect");

                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(delay) => {}
                        }

                        attempt = attempt.saturating_add(1);
                    }
                }
            }
        }
    }

    debug!("websocket loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

async fn connect_and_read<B: Backend>(
    backend: &B,
    event_tx: &broadcast::Sender<Arc<GatewayEvent>>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    let url = backend.ws_url()?;
    info!(url = %url, "connecting to websocket");

    let uri: tungstenite::http::Uri = url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::generic(e.to_string()))?;

    let mut request = ClientRequestBuilder::new(uri);
    for (name, value) in &backend.build_ws_headers().await? {
        let value = value
            .to_str()
            .map_err(|e| Error::generic(format!("invalid websocket header {name}: {e}")))?;
        request = if *name == header::SEC_WEBSOCKET_PROTOCOL {
            request.with_sub_protocol(value)
        } else {
            request.with_header(name.as_str(), value)
        };
    }

    let connector = if url.scheme() == "wss" {
        Some(Connector::Rustls(tls::client_config(&backend.transport().tls)?))
    } else {
        None
    };

    let (ws_stream, _response) =
        tokio_tungstenite::connect_async_tls_with_config(request, None, false, connector)
            .await
            .map_err(classify_ws)
            .inspect_err(|e| {
                if e.is_auth_failure() {
                    backend.invalidate_token();
                }
            })?;

    info!("websocket connected");

    let (mut write, mut read) = ws_stream.split();

    if let Some(subscription) = backend.ws_subscription() {
        debug!("sending event subscription");
        write
            .send(Message::text(subscription.to_string()))
            .await
            .map_err(classify_ws)?;
    }

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        parse_and_broadcast(text.as_str(), event_tx);
                    }
                    Some(Ok(Message::Ping(_))) => {
                        trace!("websocket ping");
                    }
                    Some(Ok(Message::Close(frame))) => {
                        if let Some(cf) = frame {
                            info!(code = %cf.code, reason = %cf.reason, "websocket close frame received");
                        } else {
                            info!("websocket close frame received (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => return Err(classify_ws(e)),
                    None => {
                        info!("websocket stream ended");
                        return Ok(());
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

/// Map a websocket failure onto the error taxonomy.
fn classify_ws(err: tungstenite::Error) -> Error {
    match err {
        tungstenite::Error::Tls(e) => Error::Ssl {
            message: e.to_string(),
        },
        tungstenite::Error::Http(resp) if matches!(resp.status().as_u16(), 401 | 403) => {
            Error::Authentication {
                message: "websocket upgrade rejected".into(),
                status: Some(resp.status().as_u16()),
            }
        }
        tungstenite::Error::Http(resp) => Error::Connection {
            message: format!("websocket upgrade failed with HTTP {}", resp.status()),
            status: Some(resp.status().as_u16()),
            source: None,
        },
        other => Error::Connection {
            message: other.to_string(),
            status: None,
            source: None,
        },
    }
}

// ── Message parsing ──────────────────────────────────────────────────

/// Parse a text frame and broadcast it if it carries an `event`.
fn parse_and_broadcast(text: &str, event_tx: &broadcast::Sender<Arc<GatewayEvent>>) {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "failed to parse websocket frame");
            return;
        }
    };

    if value.get("event").is_none() {
        trace!(frame = %value, "websocket frame without event");
        return;
    }

    match serde_json::from_value::<GatewayEvent>(value) {
        // No receivers is fine: nobody is listening right now.
        Ok(event) => {
            let _ = event_tx.send(Arc::new(event));
        }
        Err(e) => debug!(error = %e, "could not deserialize event"),
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) * (1 ± 0.25)`
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic jitter seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    Duration::from_secs_f64((capped * jitter_factor).max(0.0))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn default_reconnect_config() {
        let config = ReconnectConfig::default();
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert!(config.max_retries.is_none());
    }

    #[test]
    fn backoff_increases_exponentially() {
        let config = ReconnectConfig::default();

        let d0 = calculate_backoff(0, &config);
        let d1 = calculate_backoff(1, &config);
        let d2 = calculate_backoff(2, &config);

        assert!(d1 > d0, "d1 ({d1:?}) should be greater than d0 ({d0:?})");
        assert!(d2 > d1, "d2 ({d2:?}) should be greater than d1 ({d1:?})");
    }

    #[test]
    fn backoff_caps_at_max_delay() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_retries: None,
        };

        let d10 = calculate_backoff(10, &config);
        assert!(d10 <= Duration::from_secs(13), "delay at attempt 10 ({d10:?}) not capped");

        // Huge attempt counts must not overflow.
        let _ = calculate_backoff(u32::MAX, &config);
    }

    #[test]
    fn event_frames_are_broadcast() {
        let (tx, mut rx) = broadcast::channel(16);

        let frame = json!({
            "type": "OUTPUT_CHANGE",
            "event": {"id": 18, "status": {"on": true}},
            "data": {"id": 18},
            "installation_id": 21
        });
        parse_and_broadcast(&frame.to_string(), &tx);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind.as_deref(), Some("OUTPUT_CHANGE"));
        assert_eq!(event.event["id"], 18);
        assert_eq!(event.extra["installation_id"], 21);
    }

    #[test]
    fn frames_without_event_are_dropped() {
        let (tx, mut rx) = broadcast::channel::<Arc<GatewayEvent>>(16);

        parse_and_broadcast(&json!({"type": "ACK"}).to_string(), &tx);
        parse_and_broadcast("not json at all", &tx);

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn rejected_upgrade_is_an_auth_error() {
        let resp = tungstenite::http::Response::builder()
            .status(401)
            .body(None::<Vec<u8>>)
            .unwrap();
        let err = classify_ws(tungstenite::Error::Http(resp.into()));
        assert!(err.is_auth_failure());
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn io_failure_is_a_transient_connection_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = classify_ws(tungstenite::Error::Io(io));
        assert!(err.is_transient());
    }
}
