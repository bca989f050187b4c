//! socialnet client - real-time chat and notification delivery
//!
//! This crate contains the parts of the socialnet client that keep a live
//! connection to the backend: chat sessions, the notification feed and the
//! unread-chat feed, plus the REST calls they are seeded from.

pub mod logging;

pub mod api_client;
pub mod chat;
pub mod config;
pub mod error;
pub mod notifications;
pub mod ws;

#[cfg(feature = "dioxus")]
pub mod reactive;

pub use api_client::ApiClient;
pub use chat::ChatSession;
pub use config::ClientConfig;
pub use error::ChannelError;
pub use notifications::{NotificationFeed, UnreadChatsFeed};
pub use ws::{ChannelEvent, ChannelState, SocketChannel};
