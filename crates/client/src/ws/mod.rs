//! WebSocket module for real-time chat and notifications.
//!
//! This module provides:
//! - [`SocketChannel`]: one owner, at most one live connection, explicit state
//! - Platform transports (tokio-tungstenite natively, `web_sys::WebSocket` in the browser)
//!
//! # Architecture
//!
//! ```text
//!   ┌──────────────┐   ┌──────────────────┐   ┌────────────────┐
//!   │ ChatSession  │   │ NotificationFeed │   │ UnreadChatsFeed│
//!   └──────┬───────┘   └────────┬─────────┘   └───────┬────────┘
//!          │ next_event / send  │                     │
//!          ▼                    ▼                     ▼
//!   ┌──────────────┐   ┌──────────────────┐   ┌────────────────┐
//!   │SocketChannel │   │  SocketChannel   │   │ SocketChannel  │
//!   └──────┬───────┘   └────────┬─────────┘   └───────┬────────┘
//!          │ (generation, TransportEvent) over an unbounded mpsc
//!          ▼                    ▼                     ▼
//!   ┌──────────────┐   ┌──────────────────┐   ┌────────────────┐
//!   │  Connection  │   │   Connection     │   │  Connection    │
//!   │ (background) │   │  (background)    │   │ (background)   │
//!   └──────────────┘   └──────────────────┘   └────────────────┘
//! ```
//!
//! Connections only forward events. Each channel applies them to its own state
//! when its owner asks for the next event, so no state is shared between tasks.

mod channel;
mod connection;

pub use channel::{ChannelEvent, ChannelState, SocketChannel};
