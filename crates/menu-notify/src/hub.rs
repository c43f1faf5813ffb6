//! # WebSocket Hub
//!
//! The `/ws` endpoint cashier and admin consoles connect to.
//!
//! ## Connection Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Console                               Hub                              │
//! │     │  GET /ws (upgrade)                │                               │
//! │     │ ─────────────────────────────────►│                               │
//! │     │  {"type":"connection",...}        │  subscribe to notifier        │
//! │     │ ◄─────────────────────────────────│                               │
//! │     │                                   │                               │
//! │     │  {"type":"order_created",...}     │  every published event        │
//! │     │ ◄─────────────────────────────────│                               │
//! │     │  {"type":"ping"}                  │                               │
//! │     │ ─────────────────────────────────►│                               │
//! │     │  {"type":"pong","timestamp":...}  │                               │
//! │     │ ◄─────────────────────────────────│                               │
//! │     │  not json                         │                               │
//! │     │ ─────────────────────────────────►│                               │
//! │     │  {"type":"error",...}             │                               │
//! │     │ ◄─────────────────────────────────│                               │
//! │     │           WS Ping every 30s       │  keepalive                    │
//! │     │ ◄─────────────────────────────────│                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Consoles only listen. Nothing a client sends changes server state.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::{NotifyError, NotifyResult};
use crate::notifier::BroadcastNotifier;

// =============================================================================
// Constants
// =============================================================================

/// Default keepalive ping interval.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(30);

/// Maximum inbound message size (64KB). Clients only ever send pings.
const MAX_MESSAGE_SIZE: usize = 64 * 1024;

// =============================================================================
// Hub Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct HubConfig {
    /// How often a protocol-level Ping is sent to each client.
    pub ping_interval: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        HubConfig {
            ping_interval: DEFAULT_PING_INTERVAL,
        }
    }
}

// =============================================================================
// Server Messages
// =============================================================================

/// Messages the hub itself originates (events go out as
/// [`Notification`](crate::Notification)s).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubMessage {
    Connection {
        message: String,
        timestamp: DateTime<Utc>,
    },
    Pong {
        timestamp: DateTime<Utc>,
    },
    Error {
        message: String,
    },
}

/// Works out the reply to a text frame from a client, if any.
///
/// `{"type":"ping"}` gets a pong, unparsable input gets an error, and any
/// other well-formed message is ignored.
pub fn reply_to(text: &str) -> Option<HubMessage> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) if value.get("type").and_then(|t| t.as_str()) == Some("ping") => {
            Some(HubMessage::Pong {
                timestamp: Utc::now(),
            })
        }
        Ok(_) => None,
        Err(_) => Some(HubMessage::Error {
            message: "Invalid message format".to_string(),
        }),
    }
}

fn encode(msg: &impl Serialize) -> NotifyResult<Message> {
    Ok(Message::Text(serde_json::to_string(msg)?.into()))
}

// =============================================================================
// Hub
// =============================================================================

/// Shared state behind the `/ws` route.
#[derive(Debug)]
pub struct WsHub {
    notifier: BroadcastNotifier,
    config: HubConfig,
    clients: AtomicUsize,
}

impl WsHub {
    pub fn new(notifier: BroadcastNotifier, config: HubConfig) -> Self {
        WsHub {
            notifier,
            config,
            clients: AtomicUsize::new(0),
        }
    }

    /// Number of currently connected consoles.
    pub fn client_count(&self) -> usize {
        self.clients.load(Ordering::Relaxed)
    }

    /// Router exposing `GET /ws`, mergeable into an app router of any state.
    pub fn router<S>(self: Arc<Self>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        Router::new()
            .route("/ws", get(ws_handler))
            .with_state(self)
    }
}

// =============================================================================
// WebSocket Handler
// =============================================================================

async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<Arc<WsHub>>) -> impl IntoResponse {
    ws.max_message_size(MAX_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_socket(socket, hub))
}

async fn handle_socket(socket: WebSocket, hub: Arc<WsHub>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before greeting so nothing published after the greeting is missed
    let mut events = hub.notifier.subscribe();
    let clients = hub.clients.fetch_add(1, Ordering::Relaxed) + 1;
    info!(clients, "Console connected");

    let greeting = HubMessage::Connection {
        message: "Connected to menu notifications".to_string(),
        timestamp: Utc::now(),
    };
    if let Err(e) = send(&mut sender, &greeting).await {
        warn!(error = %e, "Failed to greet console");
        hub.clients.fetch_sub(1, Ordering::Relaxed);
        return;
    }

    let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<Message>(64);

    // Outgoing message task
    let outgoing_handle = tokio::spawn(async move {
        while let Some(msg) = outgoing_rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    // Event forwarding task
    let events_tx = outgoing_tx.clone();
    let forward_handle = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(notification) => match encode(&notification) {
                    Ok(msg) => {
                        if events_tx.send(msg).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "Failed to encode notification"),
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Console lagged behind, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Ping task
    let ping_tx = outgoing_tx.clone();
    let ping_every = hub.config.ping_interval;
    let ping_handle = tokio::spawn(async move {
        let mut ticker = interval(ping_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if ping_tx.send(Message::Ping(Default::default())).await.is_err() {
                break;
            }
        }
    });

    // Main receive loop
    while let Some(frame) = receiver.next().await {
        let reply = match frame {
            Ok(Message::Text(text)) => reply_to(text.as_str()),
            Ok(Message::Binary(data)) => reply_to(&String::from_utf8_lossy(&data)),
            Ok(Message::Ping(data)) => {
                let _ = outgoing_tx.send(Message::Pong(data)).await;
                None
            }
            Ok(Message::Pong(_)) => None,
            Ok(Message::Close(_)) => {
                debug!("Console requested close");
                break;
            }
            Err(e) => {
                warn!(error = %e, "WebSocket error");
                break;
            }
        };

        if let Some(reply) = reply {
            match encode(&reply) {
                Ok(msg) => {
                    if outgoing_tx.send(msg).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "Failed to encode reply"),
            }
        }
    }

    // Cleanup
    ping_handle.abort();
    forward_handle.abort();
    outgoing_handle.abort();
    let clients = hub.clients.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
    info!(clients, "Console disconnected");
}

async fn send(
    sender: &mut futures_util::stream::SplitSink<WebSocket, Message>,
    msg: &HubMessage,
) -> NotifyResult<()> {
    sender
        .send(encode(msg)?)
        .await
        .map_err(|e| NotifyError::Transport(e.to_string()))
}
