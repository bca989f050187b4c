//! Errors raised by socket channels and the sessions built on them.
//!
//! None of these are fatal: callers log them or keep them as a displayable value.

use thiserror::Error;

use crate::ws::ChannelState;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// `send` was called while the channel was not open. Nothing was transmitted.
    #[error("channel not ready (state: {0})")]
    NotReady(ChannelState),
    /// A chat frame was sent before the session was bound to a chat.
    #[error("chat session is not bound to a chat")]
    Unbound,
    /// The transport refused the frame or the connection could not be made.
    #[error("transport error: {0}")]
    Transport(String),
    #[error("failed to encode frame: {0}")]
    Encode(String),
}
