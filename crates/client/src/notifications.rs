//! Server-pushed notification streams.

use socialnet_shared::{
    ApiError, Notification, NotificationResponseFrame, OutboundFrame, CHAT_NOTIFICATIONS_WS_PATH,
    NOTIFICATIONS_WS_PATH,
};

use crate::api_client::ApiClient;
use crate::config::ClientConfig;
use crate::error::ChannelError;
use crate::ws::{ChannelEvent, ChannelState, SocketChannel};

/// Notifications waiting for an accept/reject decision.
///
/// Connects as soon as it is created. The server pushes batches which are
/// appended as they come; ids are not de-duplicated.
pub struct NotificationFeed {
    endpoint: String,
    channel: SocketChannel<Vec<Notification>>,
    pending: Vec<Notification>,
}

impl NotificationFeed {
    pub fn connect(config: &ClientConfig) -> Self {
        let mut feed = Self {
            endpoint: config.ws_url(NOTIFICATIONS_WS_PATH),
            channel: SocketChannel::new().with_session_cookie(config.session_cookie.clone()),
            pending: Vec::new(),
        };
        feed.reconnect();
        feed
    }

    /// Connect again to the same endpoint, e.g. after the socket errored.
    pub fn reconnect(&mut self) {
        self.channel.connect(self.endpoint.clone());
    }

    /// Wait for the next socket event, appending any batch it carries.
    pub async fn next_event(&mut self) -> Option<ChannelEvent<Vec<Notification>>> {
        let event = self.channel.next_event().await?;
        if let ChannelEvent::Message(batch) = &event {
            self.receive(batch);
        }
        Some(event)
    }

    fn receive(&mut self, batch: &[Notification]) {
        crate::log_info!("Received {} notifications", batch.len());
        self.pending.extend_from_slice(batch);
    }

    /// Answer a notification and drop it from the pending list.
    ///
    /// The entry is removed even when the response could not be sent; the
    /// error is returned but nothing is rolled back or retried.
    pub fn respond(&mut self, notification_id: i64, accepted: bool) -> Result<(), ChannelError> {
        let frame = OutboundFrame::from(NotificationResponseFrame {
            notification_id,
            accepted,
        });
        let result = self.channel.send(&frame);
        if let Err(e) = &result {
            crate::log_warn!(
                "Response to notification {} not delivered: {}",
                notification_id,
                e
            );
        }
        self.pending
            .retain(|notification| notification.notification_id != notification_id);
        result
    }

    pub fn pending(&self) -> &[Notification] {
        &self.pending
    }

    pub fn state(&self) -> &ChannelState {
        self.channel.state()
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_connected()
    }

    pub fn close(&mut self) {
        self.channel.close();
    }
}

/// Chats with unread messages.
///
/// Every frame from the server is the complete list, so it replaces what was
/// there before.
pub struct UnreadChatsFeed {
    channel: SocketChannel<Option<Vec<i64>>>,
    unread: Vec<i64>,
}

impl UnreadChatsFeed {
    pub fn connect(config: &ClientConfig) -> Self {
        let mut channel = SocketChannel::new().with_session_cookie(config.session_cookie.clone());
        channel.connect(config.ws_url(CHAT_NOTIFICATIONS_WS_PATH));
        Self {
            channel,
            unread: Vec::new(),
        }
    }

    /// Seed the list from the REST endpoint. On failure the list is left as it was.
    pub async fn refresh(&mut self, api: &ApiClient) -> Result<(), ApiError> {
        match api.get_unread_chats().await {
            Ok(unread) => {
                self.unread = unread;
                Ok(())
            }
            Err(e) => {
                crate::log_error!("Fetch unread chats error: {}", e);
                Err(e)
            }
        }
    }

    /// Wait for the next socket event, replacing the unread list on a message.
    pub async fn next_event(&mut self) -> Option<ChannelEvent<Vec<i64>>> {
        let event = match self.channel.next_event().await? {
            ChannelEvent::Message(unread) => {
                // The backend encodes an empty list as null
                let unread = unread.unwrap_or_default();
                self.unread = unread.clone();
                ChannelEvent::Message(unread)
            }
            ChannelEvent::Opened => ChannelEvent::Opened,
            ChannelEvent::Closed { reason } => ChannelEvent::Closed { reason },
            ChannelEvent::Errored(reason) => ChannelEvent::Errored(reason),
        };
        Some(event)
    }

    pub fn unread(&self) -> &[i64] {
        &self.unread
    }

    pub fn has_unread(&self, chat_id: i64) -> bool {
        self.unread.contains(&chat_id)
    }

    pub fn state(&self) -> &ChannelState {
        self.channel.state()
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_connected()
    }

    pub fn close(&mut self) {
        self.channel.close();
    }
}
