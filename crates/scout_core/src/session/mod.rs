//! Relay connection lifecycle management.
//!
//! A dedicated tokio task owns the WebSocket and the reconnect timer; the
//! tick driver interacts with it purely through channels and never blocks
//! on the network. Inbound relay traffic is delivered as [`SessionEvent`]s
//! drained by the coordinator at the start of each tick, which keeps
//! relay-ordered updates atomic with respect to tick processing.

use crate::protocol::{self, ClientMessage, RelayMessage};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_tungstenite::tungstenite::{Bytes, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

/// Connection lifecycle states.
///
/// `Connecting` and `Connected` fall back to `Disconnected` on any close or
/// transport failure, then loop back through `Connecting` after the fixed
/// reconnect delay for as long as reconnection is still desired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Session activity surfaced to the coordinator, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A connection to the relay was established. The relay holds no
    /// session memory, so the coordinator must resubscribe on this event.
    Connected,
    /// The connection was lost or a connection attempt failed. Must be
    /// treated exactly like an explicit reporter-role revocation.
    Disconnected,
    /// A parsed inbound relay message.
    Relay(RelayMessage),
}

/// Relay endpoint and timing policy.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// WebSocket URL of the relay
    pub url: String,
    /// Fixed delay between a disconnect and the single scheduled reconnect
    /// attempt. No backoff growth, no attempt cap.
    pub reconnect_delay: Duration,
    /// Keepalive ping cadence while connected
    pub ping_interval: Duration,
}

impl SessionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_delay: Duration::from_secs(5),
            ping_interval: Duration::from_secs(30),
        }
    }
}

/// Owns the relay connection lifecycle: connect, reconnect with a fixed
/// delay, fire-and-forget sends, and delivery of inbound events.
///
/// All methods are non-blocking; the actual I/O happens on the session
/// task spawned by [`connect`](Self::connect).
#[derive(Debug)]
pub struct SessionManager {
    config: SessionConfig,
    outbound_tx: mpsc::UnboundedSender<ClientMessage>,
    outbound_rx: Option<mpsc::UnboundedReceiver<ClientMessage>>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    state_tx: Option<watch::Sender<ConnectionState>>,
    state_rx: watch::Receiver<ConnectionState>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    task: Option<tokio::task::JoinHandle<()>>,
    closed: bool,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            config,
            outbound_tx,
            outbound_rx: Some(outbound_rx),
            events_tx,
            events_rx,
            state_tx: Some(state_tx),
            state_rx,
            shutdown_tx,
            shutdown_rx,
            task: None,
            closed: false,
        }
    }

    /// Starts the session task. Idempotent: a no-op while the task is
    /// already running (connecting or connected) and after [`close`](Self::close).
    pub fn connect(&mut self) {
        if self.closed || self.task.is_some() {
            return;
        }
        let (Some(outbound_rx), Some(state_tx)) = (self.outbound_rx.take(), self.state_tx.take())
        else {
            return;
        };
        let config = self.config.clone();
        let events_tx = self.events_tx.clone();
        let shutdown_rx = self.shutdown_rx.clone();
        self.task = Some(tokio::spawn(run_session_loop(
            config,
            outbound_rx,
            events_tx,
            state_tx,
            shutdown_rx,
        )));
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// A watch receiver over the connection state, for display code.
    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Queues a message for transmission. Fire-and-forget: while not
    /// connected the message is dropped with a debug log, not an error —
    /// everything sent here is either re-derivable state or safe to lose.
    pub fn send(&self, message: ClientMessage) {
        if !self.is_connected() {
            debug!(?message, "not connected, dropping outbound message");
            return;
        }
        let _ = self.outbound_tx.send(message);
    }

    /// Next pending session event, if any. Never blocks.
    pub fn poll_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.try_recv().ok()
    }

    /// Disables reconnection and tears down any live connection. Terminal:
    /// a closed session never reconnects and ignores further `connect`
    /// calls.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let _ = self.shutdown_tx.send(true);
    }

    #[cfg(test)]
    pub(crate) async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.recv().await
    }

    /// Builds a manager with no session task, exposing the channel ends a
    /// test harness needs to play the relay's part.
    #[cfg(test)]
    pub(crate) fn loopback() -> (
        Self,
        mpsc::UnboundedReceiver<ClientMessage>,
        mpsc::UnboundedSender<SessionEvent>,
        watch::Sender<ConnectionState>,
    ) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connected);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let manager = Self {
            config: SessionConfig::new("ws://loopback.invalid"),
            outbound_tx,
            outbound_rx: None,
            events_tx: events_tx.clone(),
            events_rx,
            state_tx: None,
            state_rx,
            shutdown_tx,
            shutdown_rx,
            task: None,
            closed: false,
        };
        (manager, outbound_rx, events_tx, state_tx)
    }
}

/// Connect-forever loop owned by the session task.
///
/// Each pass makes one connection attempt; on any failure or disconnect it
/// schedules exactly one retry after the fixed delay. The shutdown watch
/// cancels both the in-flight connection and the pending sleep.
async fn run_session_loop(
    config: SessionConfig,
    mut outbound_rx: mpsc::UnboundedReceiver<ClientMessage>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    state_tx: watch::Sender<ConnectionState>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }
        let _ = state_tx.send(ConnectionState::Connecting);
        debug!(url = %config.url, "connecting to relay");

        tokio::select! {
            result = connect_async(&config.url) => match result {
                Ok((stream, _response)) => {
                    info!(url = %config.url, "connected to relay");
                    let _ = state_tx.send(ConnectionState::Connected);
                    // Anything queued while offline is stale by now; the
                    // coordinator resubscribes on the Connected event.
                    while outbound_rx.try_recv().is_ok() {}
                    if events_tx.send(SessionEvent::Connected).is_err() {
                        break;
                    }
                    drive_connection(
                        stream,
                        &mut outbound_rx,
                        &events_tx,
                        &mut shutdown_rx,
                        config.ping_interval,
                    )
                    .await;
                    let _ = state_tx.send(ConnectionState::Disconnected);
                    if events_tx.send(SessionEvent::Disconnected).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(url = %config.url, error = %e, "failed to connect to relay");
                    let _ = state_tx.send(ConnectionState::Disconnected);
                    if events_tx.send(SessionEvent::Disconnected).is_err() {
                        break;
                    }
                }
            },
            _ = shutdown_rx.changed() => break,
        }

        if *shutdown_rx.borrow() {
            break;
        }
        debug!(delay = ?config.reconnect_delay, "scheduling reconnect");
        tokio::select! {
            _ = sleep(config.reconnect_delay) => {}
            _ = shutdown_rx.changed() => break,
        }
    }
    let _ = state_tx.send(ConnectionState::Disconnected);
    debug!("session task stopped");
}

/// Pumps one live connection until it drops or shutdown is requested.
async fn drive_connection(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    outbound_rx: &mut mpsc::UnboundedReceiver<ClientMessage>,
    events_tx: &mpsc::UnboundedSender<SessionEvent>,
    shutdown_rx: &mut watch::Receiver<bool>,
    ping_interval: Duration,
) {
    let (mut sink, mut source) = stream.split();
    let mut keepalive = interval(ping_interval);
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first interval tick completes immediately; consume it so pings
    // start one full interval after connecting.
    keepalive.tick().await;

    loop {
        tokio::select! {
            inbound = source.next() => match inbound {
                Some(Ok(Message::Text(text))) => match protocol::decode_relay(text.as_str()) {
                    Ok(message) => {
                        if events_tx.send(SessionEvent::Relay(message)).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, frame = %text, "dropping unparseable relay frame");
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "relay closed the connection");
                    return;
                }
                Some(Ok(_)) => {} // ping/pong/binary frames carry nothing for us
                Some(Err(e)) => {
                    warn!(error = %e, "relay read error");
                    return;
                }
                None => {
                    debug!("relay stream ended");
                    return;
                }
            },
            outbound = outbound_rx.recv() => match outbound {
                Some(message) => {
                    let text = protocol::encode_client(&message);
                    debug!(%text, "sending to relay");
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        warn!(error = %e, "relay write error");
                        return;
                    }
                }
                // Manager dropped; nothing left to serve.
                None => return,
            },
            _ = keepalive.tick() => {
                if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                    return;
                }
            }
            _ = shutdown_rx.changed() => {
                let _ = sink.send(Message::Close(None)).await;
                return;
            }
        }
    }
}
