//! Outbound WebSocket frames and endpoint paths.
//!
//! Every frame is a single JSON object sent as a UTF-8 text frame.

use serde::{Deserialize, Serialize};

/// Chat socket. The first client frame after open must be a [`SubscribeFrame`].
pub const CHAT_WS_PATH: &str = "/api/chat/ws";
/// Notification socket. No handshake; the server pushes batches of notifications.
pub const NOTIFICATIONS_WS_PATH: &str = "/api/notifications/ws";
/// Unread-chat socket. No handshake; the server pushes the full unread chat id list.
pub const CHAT_NOTIFICATIONS_WS_PATH: &str = "/api/chat-notifications/ws";

pub const GET_MESSAGES_PATH: &str = "/api/get-messages";
pub const GET_CHATS_PATH: &str = "/api/get-chats";
pub const UNREAD_MESSAGES_PATH: &str = "/api/unread-messages";
pub const AUTH_STATUS_PATH: &str = "/api/auth/status";

/// Binds a chat socket connection to one chat.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscribeFrame {
    pub chat_id: i64,
}

/// A message posted to a chat. The server stores it and echoes it to every
/// subscriber of the chat, including the sender.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessageFrame {
    pub chat_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub created_at: String,
}

/// Accept or reject a pending notification.
///
/// Serialized as `{"action":"notification_response","notification_id":..,"accepted":..}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename = "notification_response")]
pub struct NotificationResponseFrame {
    pub notification_id: i64,
    pub accepted: bool,
}

/// Any frame a client sends.
///
/// Variant order matters for deserialization: the most specific shape comes first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OutboundFrame {
    NotificationResponse(NotificationResponseFrame),
    ChatMessage(ChatMessageFrame),
    Subscribe(SubscribeFrame),
}

impl From<SubscribeFrame> for OutboundFrame {
    fn from(frame: SubscribeFrame) -> Self {
        OutboundFrame::Subscribe(frame)
    }
}

impl From<ChatMessageFrame> for OutboundFrame {
    fn from(frame: ChatMessageFrame) -> Self {
        OutboundFrame::ChatMessage(frame)
    }
}

impl From<NotificationResponseFrame> for OutboundFrame {
    fn from(frame: NotificationResponseFrame) -> Self {
        OutboundFrame::NotificationResponse(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn subscribe_frame_is_bare_chat_id() {
        let value = serde_json::to_value(OutboundFrame::from(SubscribeFrame { chat_id: 42 })).unwrap();
        assert_eq!(value, json!({ "chat_id": 42 }));
    }

    #[test]
    fn notification_response_carries_action_tag() {
        let frame = NotificationResponseFrame {
            notification_id: 1,
            accepted: true,
        };
        let value = serde_json::to_value(frame).unwrap();
        assert_eq!(
            value,
            json!({ "action": "notification_response", "notification_id": 1, "accepted": true })
        );
    }

    #[test]
    fn untagged_parse_picks_the_right_shape() {
        let sub: OutboundFrame = serde_json::from_value(json!({ "chat_id": 7 })).unwrap();
        assert_eq!(sub, OutboundFrame::Subscribe(SubscribeFrame { chat_id: 7 }));

        let msg: OutboundFrame = serde_json::from_value(json!({
            "chat_id": 7,
            "sender_id": 3,
            "content": "hey",
            "created_at": "2024-05-01T10:00:00.000Z"
        }))
        .unwrap();
        assert!(matches!(msg, OutboundFrame::ChatMessage(ref m) if m.content == "hey"));

        let ack: OutboundFrame = serde_json::from_value(json!({
            "action": "notification_response",
            "notification_id": 5,
            "accepted": false
        }))
        .unwrap();
        assert_eq!(
            ack,
            OutboundFrame::NotificationResponse(NotificationResponseFrame {
                notification_id: 5,
                accepted: false
            })
        );
    }
}
