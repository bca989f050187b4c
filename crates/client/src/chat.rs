//! A chat conversation: REST history plus the live chat socket.

use chrono::{SecondsFormat, Utc};
use socialnet_shared::{
    ChatMessage, ChatMessageFrame, OutboundFrame, SubscribeFrame, CHAT_WS_PATH,
};

use crate::api_client::ApiClient;
use crate::config::ClientConfig;
use crate::error::ChannelError;
use crate::ws::{ChannelEvent, ChannelState, SocketChannel};

/// One open chat.
///
/// Messages are kept in arrival order: the fetched history first, then whatever
/// the socket delivers for the bound chat. Frames for any other chat are discarded.
pub struct ChatSession {
    api: ApiClient,
    endpoint: String,
    channel: SocketChannel<ChatMessage>,
    /// The subject the socket is bound to. Set by `open`.
    chat_id: Option<i64>,
    messages: Vec<ChatMessage>,
    is_loading: bool,
    error: Option<String>,
}

impl ChatSession {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            api: ApiClient::from_config(config),
            endpoint: config.ws_url(CHAT_WS_PATH),
            channel: SocketChannel::new().with_session_cookie(config.session_cookie.clone()),
            chat_id: None,
            messages: Vec::new(),
            is_loading: false,
            error: None,
        }
    }

    /// Load the history of `chat_id` and connect the chat socket to it.
    ///
    /// A failed fetch is kept in [`ChatSession::error`] and leaves the previous
    /// messages in place; the socket is connected either way. The subscribe
    /// frame goes out once the socket reports open (see [`ChatSession::next_event`]).
    pub async fn open(&mut self, chat_id: i64) -> &[ChatMessage] {
        self.is_loading = true;
        self.chat_id = Some(chat_id);
        self.error = None;

        match self.api.get_messages(chat_id).await {
            Ok(history) => {
                crate::log_debug!("Loaded {} messages for chat {}", history.len(), chat_id);
                self.messages = history;
            }
            Err(e) => {
                crate::log_error!("Fetch messages error for chat {}: {}", chat_id, e);
                self.error = Some(e.to_string());
            }
        }
        self.is_loading = false;

        self.channel.connect(self.endpoint.clone());
        &self.messages
    }

    /// Wait for the next socket event and apply it.
    ///
    /// Subscribes on open, appends messages for the bound chat and skips
    /// everything else. Returns `None` once the socket is gone.
    pub async fn next_event(&mut self) -> Option<ChannelEvent<ChatMessage>> {
        loop {
            let event = self.channel.next_event().await?;
            match event {
                ChannelEvent::Opened => {
                    if let Some(chat_id) = self.chat_id {
                        let subscribe = OutboundFrame::from(SubscribeFrame { chat_id });
                        if let Err(e) = self.channel.send(&subscribe) {
                            crate::log_error!("Subscribe to chat {} failed: {}", chat_id, e);
                        }
                    }
                    return Some(ChannelEvent::Opened);
                }
                ChannelEvent::Message(message) => {
                    if Some(message.chat_id) != self.chat_id {
                        crate::log_debug!(
                            "Discarding message for chat {} (bound to {:?})",
                            message.chat_id,
                            self.chat_id
                        );
                        continue;
                    }
                    self.messages.push(message.clone());
                    return Some(ChannelEvent::Message(message));
                }
                other => return Some(other),
            }
        }
    }

    /// Post `text` to the bound chat.
    ///
    /// The message is not added locally; it shows up when the server echoes it back.
    pub fn send(&self, sender_id: i64, text: impl Into<String>) -> Result<(), ChannelError> {
        let Some(chat_id) = self.chat_id else {
            crate::log_warn!("Chat session not bound, message not sent");
            return Err(ChannelError::Unbound);
        };
        let frame = OutboundFrame::from(ChatMessageFrame {
            chat_id,
            sender_id,
            content: text.into(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        });
        self.channel.send(&frame)
    }

    pub fn close(&mut self) {
        self.channel.close();
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn chat_id(&self) -> Option<i64> {
        self.chat_id
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// The last history fetch failure, cleared by the next `open`.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn state(&self) -> &ChannelState {
        self.channel.state()
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_connected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_before_open_is_unbound() {
        let session = ChatSession::new(&ClientConfig::default());
        assert_eq!(session.send(1, "hi"), Err(ChannelError::Unbound));
        assert!(session.messages().is_empty());
        assert_eq!(session.chat_id(), None);
        assert_eq!(session.state(), &ChannelState::Closed);
    }

    #[test]
    fn close_on_fresh_session_is_harmless() {
        let mut session = ChatSession::new(&ClientConfig::default());
        session.close();
        session.close();
        assert!(!session.is_connected());
    }
}
