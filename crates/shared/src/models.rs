//! Shared data models for the socialnet chat and notification endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Chats ---

/// A chat the current user participates in, as listed by `/api/get-chats`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatInfo {
    pub chat_id: i64,
    pub full_name: String,
}

/// A chat message, either from the history endpoint or pushed over the chat socket.
///
/// Pushed messages are echoes of what a client sent, so everything except
/// `chat_id` may be missing and falls back to its default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// Only present on messages served by the history endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
    pub chat_id: i64,
    #[serde(default)]
    pub sender_id: i64,
    #[serde(default)]
    pub content: String,
    /// Kept as the server sent it; history rows and echoed frames use different formats.
    #[serde(default)]
    pub created_at: String,
}

/// Request body for `/api/get-messages`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub chat_id: i64,
}

// --- Notifications ---

/// A notification awaiting the user's accept/reject decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub notification_id: i64,
    #[serde(default)]
    pub user_id: i64,
    /// e.g. `follow_request`, `group_invitation`, `join_group_request`
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub reference_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

// --- Auth ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthStatus {
    #[serde(rename = "isAuthenticated")]
    pub is_authenticated: bool,
}
