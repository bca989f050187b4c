//! Transport-level WebSocket connections.
//!
//! A connection never touches session state. It forwards what the socket does
//! as [`TransportEvent`]s, tagged with the generation of the connect call that
//! created it, so the owning channel can ignore connections it has replaced.

use futures_channel::mpsc::UnboundedSender;

/// Raw things a socket can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TransportEvent {
    Open,
    Text(String),
    Closed { reason: Option<String> },
    Error(String),
}

pub(crate) type EventSender = UnboundedSender<(u64, TransportEvent)>;

/// Everything needed to open one connection.
#[derive(Debug, Clone)]
pub(crate) struct ConnectRequest {
    pub generation: u64,
    pub endpoint: String,
    /// Sent as the `Cookie` header where the platform lets us set it.
    pub session_cookie: Option<String>,
}

// Include platform-specific implementation
#[cfg(target_arch = "wasm32")]
mod connection_wasm;
#[cfg(target_arch = "wasm32")]
pub(crate) use connection_wasm::{open, Connection};

#[cfg(not(target_arch = "wasm32"))]
mod connection_native;
#[cfg(not(target_arch = "wasm32"))]
pub(crate) use connection_native::{open, Connection};
