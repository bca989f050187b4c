//! A single-owner WebSocket channel with an explicit state machine.

use std::fmt;

use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::connection::{self, ConnectRequest, Connection, TransportEvent};
use crate::error::ChannelError;

/// Connection state of a [`SocketChannel`].
///
/// ```text
/// Closed ──connect──▶ Connecting ──open──▶ Open ──close / transport close──▶ Closed
///                          │                 │
///                          └──── error ──────┴──▶ Errored ──connect──▶ Connecting
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
    Errored { reason: String },
}

impl ChannelState {
    pub fn is_open(&self) -> bool {
        matches!(self, ChannelState::Open)
    }

    /// Connecting or Open: a transport connection exists.
    pub fn is_live(&self) -> bool {
        matches!(self, ChannelState::Connecting | ChannelState::Open)
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Connecting => write!(f, "connecting"),
            ChannelState::Open => write!(f, "open"),
            ChannelState::Closed => write!(f, "closed"),
            ChannelState::Errored { reason } => write!(f, "errored: {}", reason),
        }
    }
}

/// What the owner of a channel sees, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent<T> {
    Opened,
    Message(T),
    Closed { reason: Option<String> },
    Errored(String),
}

/// Owns at most one WebSocket connection and the state derived from it.
///
/// Transport work happens in the background, but nothing here changes until the
/// owner pulls the next event with [`SocketChannel::next_event`]. State is
/// therefore only ever touched by the task that owns the channel.
pub struct SocketChannel<T> {
    endpoint: Option<String>,
    session_cookie: Option<String>,
    state: ChannelState,
    /// Bumped on every connect and close; events tagged with an older value are stale.
    generation: u64,
    connection: Option<Connection>,
    events_tx: UnboundedSender<(u64, TransportEvent)>,
    events_rx: UnboundedReceiver<(u64, TransportEvent)>,
    handler: Option<Box<dyn FnMut(&T)>>,
}

impl<T: DeserializeOwned> Default for SocketChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> SocketChannel<T> {
    pub fn new() -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            endpoint: None,
            session_cookie: None,
            state: ChannelState::Closed,
            generation: 0,
            connection: None,
            events_tx,
            events_rx,
            handler: None,
        }
    }

    /// Present this cookie on every handshake (native only; browsers send their own).
    pub fn with_session_cookie(mut self, cookie: Option<String>) -> Self {
        self.session_cookie = cookie;
        self
    }

    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_open()
    }

    /// Endpoint of the most recent `connect`.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Open a connection to `endpoint`, closing any connection that is still live.
    ///
    /// The state is `Connecting` on return and becomes `Open` once the transport
    /// reports it and the owner has pulled that event.
    pub fn connect(&mut self, endpoint: impl Into<String>) {
        let endpoint = endpoint.into();
        self.release();
        self.generation += 1;
        self.endpoint = Some(endpoint.clone());

        crate::log_info!("Connecting to {} (connection #{})", endpoint, self.generation);
        let request = ConnectRequest {
            generation: self.generation,
            endpoint,
            session_cookie: self.session_cookie.clone(),
        };
        match connection::open(request, self.events_tx.clone()) {
            Ok(connection) => {
                self.connection = Some(connection);
                self.state = ChannelState::Connecting;
            }
            Err(reason) => {
                crate::log_error!("Connect failed: {}", reason);
                self.state = ChannelState::Errored { reason };
            }
        }
    }

    /// Serialize `frame` to JSON and transmit it.
    ///
    /// On a channel that is not open nothing is sent: the attempt is logged and
    /// reported as [`ChannelError::NotReady`].
    pub fn send<F: Serialize + ?Sized>(&self, frame: &F) -> Result<(), ChannelError> {
        let connection = match (&self.state, &self.connection) {
            (ChannelState::Open, Some(connection)) => connection,
            _ => {
                crate::log_warn!("Channel not ready ({}), frame not sent", self.state);
                return Err(ChannelError::NotReady(self.state.clone()));
            }
        };
        let json = serde_json::to_string(frame).map_err(|e| ChannelError::Encode(e.to_string()))?;
        crate::log_debug!("Sending: {}", json);
        connection.send(json)
    }

    /// Register the message handler. A later registration replaces the earlier one.
    ///
    /// The handler runs inside [`SocketChannel::next_event`], before the
    /// message is returned.
    pub fn on_message(&mut self, handler: impl FnMut(&T) + 'static) {
        self.handler = Some(Box::new(handler));
    }

    /// Wait for the next event of the current connection.
    ///
    /// Returns `None` once there is no live connection left to hear from.
    /// Cancel-safe: dropping the future loses no events.
    pub async fn next_event(&mut self) -> Option<ChannelEvent<T>> {
        loop {
            self.connection.as_ref()?;
            let (generation, event) = self.events_rx.next().await?;
            if generation != self.generation {
                crate::log_debug!("Dropping event from replaced connection #{}", generation);
                continue;
            }

            match event {
                TransportEvent::Open => {
                    self.state = ChannelState::Open;
                    return Some(ChannelEvent::Opened);
                }
                TransportEvent::Text(text) => match serde_json::from_str::<T>(&text) {
                    Ok(payload) => {
                        if let Some(handler) = self.handler.as_mut() {
                            handler(&payload);
                        }
                        return Some(ChannelEvent::Message(payload));
                    }
                    Err(e) => {
                        crate::log_warn!(
                            "Dropping malformed frame from {}: {}",
                            self.endpoint.as_deref().unwrap_or("?"),
                            e
                        );
                    }
                },
                TransportEvent::Closed { reason } => {
                    self.connection = None;
                    self.state = ChannelState::Closed;
                    return Some(ChannelEvent::Closed { reason });
                }
                TransportEvent::Error(reason) => {
                    self.release();
                    self.state = ChannelState::Errored {
                        reason: reason.clone(),
                    };
                    return Some(ChannelEvent::Errored(reason));
                }
            }
        }
    }

    /// Close the channel. Safe to call any number of times, in any state.
    pub fn close(&mut self) {
        self.release();
        self.generation += 1;
        if self.state != ChannelState::Closed {
            crate::log_info!(
                "Closing channel to {}",
                self.endpoint.as_deref().unwrap_or("?")
            );
        }
        self.state = ChannelState::Closed;
    }
}

impl<T> SocketChannel<T> {
    fn release(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
    }
}

impl<T> Drop for SocketChannel<T> {
    fn drop(&mut self) {
        self.release();
    }
}
