//! Dioxus bindings for chat sessions and notification feeds.
//!
//! Each hook owns its session inside a coroutine and mirrors the session state
//! into signals after every step. Components read the signals and drive the
//! session through commands. When the owning component unmounts the coroutine
//! is dropped, and with it the session and its socket.
//!
//! ```rust,ignore
//! #[component]
//! fn App() -> Element {
//!     provide_notification_feed(ClientConfig::from_env());
//!     rsx! { Router::<Route> {} }
//! }
//!
//! #[component]
//! fn Inbox() -> Element {
//!     let feed = use_notification_feed();
//!     rsx! {
//!         for n in feed.notifications.read().iter().cloned() {
//!             button { onclick: move |_| feed.respond(n.notification_id, true), "{n.message}" }
//!         }
//!     }
//! }
//! ```

use dioxus::prelude::*;
use futures_channel::mpsc::UnboundedReceiver;
use futures_util::future::{select, Either};
use futures_util::{pin_mut, StreamExt};
use socialnet_shared::{ChatMessage, Notification};

use crate::chat::ChatSession;
use crate::config::ClientConfig;
use crate::notifications::{NotificationFeed, UnreadChatsFeed};
use crate::ws::ChannelEvent;

/// What a session loop wakes up for.
enum Step<C, E> {
    Command(Option<C>),
    Event(Option<E>),
}

// --- Chat ---

#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    Open(i64),
    Send { sender_id: i64, text: String },
    Close,
}

/// Reactive view of a [`ChatSession`].
#[derive(Clone, Copy)]
pub struct ChatHandle {
    pub messages: Signal<Vec<ChatMessage>>,
    pub connected: Signal<bool>,
    pub is_loading: Signal<bool>,
    pub error: Signal<Option<String>>,
    commands: Coroutine<ChatCommand>,
}

impl ChatHandle {
    pub fn open(&self, chat_id: i64) {
        self.commands.send(ChatCommand::Open(chat_id));
    }

    pub fn send(&self, sender_id: i64, text: impl Into<String>) {
        self.commands.send(ChatCommand::Send {
            sender_id,
            text: text.into(),
        });
    }

    pub fn close(&self) {
        self.commands.send(ChatCommand::Close);
    }
}

/// A chat session owned by the calling component.
pub fn use_chat_session(config: ClientConfig) -> ChatHandle {
    let mut messages = use_signal(Vec::<ChatMessage>::new);
    let mut connected = use_signal(|| false);
    let mut is_loading = use_signal(|| false);
    let mut error = use_signal(|| None::<String>);

    let commands = use_coroutine(move |mut rx: UnboundedReceiver<ChatCommand>| {
        let config = config.clone();
        async move {
            let mut session = ChatSession::new(&config);
            loop {
                let step = if session.state().is_live() {
                    let command = rx.next();
                    let event = session.next_event();
                    pin_mut!(event);
                    match select(command, event).await {
                        Either::Left((command, _)) => Step::Command(command),
                        Either::Right((event, _)) => Step::Event(event),
                    }
                } else {
                    Step::Command(rx.next().await)
                };

                match step {
                    Step::Command(None) => break,
                    Step::Command(Some(ChatCommand::Open(chat_id))) => {
                        is_loading.set(true);
                        session.open(chat_id).await;
                        error.set(session.error().map(str::to_owned));
                    }
                    Step::Command(Some(ChatCommand::Send { sender_id, text })) => {
                        if let Err(e) = session.send(sender_id, text) {
                            error.set(Some(e.to_string()));
                        }
                    }
                    Step::Command(Some(ChatCommand::Close)) => session.close(),
                    Step::Event(Some(ChannelEvent::Errored(reason))) => {
                        error.set(Some(reason));
                    }
                    Step::Event(_) => {}
                }

                if *messages.peek() != session.messages() {
                    messages.set(session.messages().to_vec());
                }
                connected.set(session.is_connected());
                is_loading.set(session.is_loading());
            }
            session.close();
        }
    });

    ChatHandle {
        messages,
        connected,
        is_loading,
        error,
        commands,
    }
}

// --- Notifications ---

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeedCommand {
    Respond { notification_id: i64, accepted: bool },
    Reconnect,
}

/// Reactive view of a [`NotificationFeed`], shared through the component context.
#[derive(Clone, Copy)]
pub struct NotificationsContext {
    pub notifications: Signal<Vec<Notification>>,
    pub connected: Signal<bool>,
    /// Why the last response could not be delivered, cleared by the next one that is.
    pub error: Signal<Option<String>>,
    commands: Coroutine<FeedCommand>,
}

impl NotificationsContext {
    pub fn respond(&self, notification_id: i64, accepted: bool) {
        self.commands.send(FeedCommand::Respond {
            notification_id,
            accepted,
        });
    }

    pub fn reconnect(&self) {
        self.commands.send(FeedCommand::Reconnect);
    }
}

/// Create the notification feed and make it available to every descendant.
///
/// Call once, near the root, after the session cookie is known.
pub fn provide_notification_feed(config: ClientConfig) -> NotificationsContext {
    let mut notifications = use_signal(Vec::<Notification>::new);
    let mut connected = use_signal(|| false);
    let mut error = use_signal(|| None::<String>);

    let commands = use_coroutine(move |mut rx: UnboundedReceiver<FeedCommand>| {
        let config = config.clone();
        async move {
            let mut feed = NotificationFeed::connect(&config);
            loop {
                let step = if feed.state().is_live() {
                    let command = rx.next();
                    let event = feed.next_event();
                    pin_mut!(event);
                    match select(command, event).await {
                        Either::Left((command, _)) => Step::Command(command),
                        Either::Right((event, _)) => Step::Event(event),
                    }
                } else {
                    Step::Command(rx.next().await)
                };

                match step {
                    Step::Command(None) => break,
                    Step::Command(Some(FeedCommand::Respond {
                        notification_id,
                        accepted,
                    })) => {
                        // The entry is gone either way
                        let failure = feed.respond(notification_id, accepted).err();
                        error.set(failure.map(|e| e.to_string()));
                    }
                    Step::Command(Some(FeedCommand::Reconnect)) => feed.reconnect(),
                    Step::Event(_) => {}
                }

                notifications.set(feed.pending().to_vec());
                connected.set(feed.is_connected());
            }
            feed.close();
        }
    });

    use_context_provider(|| NotificationsContext {
        notifications,
        connected,
        error,
        commands,
    })
}

/// The feed provided by an ancestor through [`provide_notification_feed`].
pub fn use_notification_feed() -> NotificationsContext {
    use_context::<NotificationsContext>()
}

// --- Unread chats ---

/// Ids of chats with unread messages, kept current by the server.
pub fn use_unread_chats(config: ClientConfig) -> Signal<Vec<i64>> {
    let mut unread = use_signal(Vec::<i64>::new);

    use_coroutine(move |_: UnboundedReceiver<()>| {
        let config = config.clone();
        async move {
            let mut feed = UnreadChatsFeed::connect(&config);
            let api = crate::ApiClient::from_config(&config);
            if feed.refresh(&api).await.is_ok() {
                unread.set(feed.unread().to_vec());
            }
            while let Some(event) = feed.next_event().await {
                if let ChannelEvent::Message(ids) = event {
                    unread.set(ids);
                }
            }
        }
    });

    unread
}
