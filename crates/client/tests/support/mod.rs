//! In-process fake of the socialnet backend for integration tests.
//!
//! Serves the REST endpoints with canned bodies and the three sockets with
//! scripted pushes. Every text frame a client sends is forwarded to
//! [`Backend::received`] so tests can assert on the wire.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, post};
use axum::Router;
use socialnet_client::ClientConfig;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

pub const GOOD_COOKIE: &str = "session_token=good";

/// Upper bound for any single await in a test.
pub const STEP: Duration = Duration::from_secs(5);

/// Await `fut`, failing the test if it takes longer than [`STEP`].
pub async fn within<F: std::future::Future>(fut: F) -> F::Output {
    tokio::time::timeout(STEP, fut)
        .await
        .expect("step timed out")
}

/// How the chat socket ends once its pushes after the subscribe frame are out.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEnding {
    /// Keep the socket open, echoing chat messages.
    Stay,
    /// Send a close frame with this reason.
    Close(String),
    /// Drop the TCP stream without a closing handshake.
    Drop,
}

/// What the fake backend answers and pushes.
#[derive(Clone)]
pub struct Script {
    pub history_status: StatusCode,
    pub history_body: String,
    /// Frames pushed on the chat socket once the subscribe frame arrived.
    pub chat_push: Vec<String>,
    /// Echo every chat message frame back to the sender, like the real server.
    pub echo_chat: bool,
    pub chat_ending: ChatEnding,
    /// Frames pushed on the notification socket right after it opens.
    pub notification_push: Vec<String>,
    /// Frames pushed on the unread-chat socket right after it opens.
    pub unread_push: Vec<String>,
    pub unread_body: String,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            history_status: StatusCode::OK,
            history_body: "null".to_string(),
            chat_push: Vec::new(),
            echo_chat: true,
            chat_ending: ChatEnding::Stay,
            notification_push: Vec::new(),
            unread_push: Vec::new(),
            unread_body: "null".to_string(),
        }
    }
}

struct Shared {
    script: Script,
    frames: UnboundedSender<(&'static str, String)>,
    open_sockets: AtomicUsize,
    handshake_cookies: Mutex<Vec<Option<String>>>,
}

pub struct Backend {
    pub addr: SocketAddr,
    /// `(socket path, frame text)` for every frame a client sent.
    pub received: UnboundedReceiver<(&'static str, String)>,
    shared: Arc<Shared>,
}

impl Backend {
    pub async fn spawn(script: Script) -> Self {
        let (frames, received) = unbounded_channel();
        let shared = Arc::new(Shared {
            script,
            frames,
            open_sockets: AtomicUsize::new(0),
            handshake_cookies: Mutex::new(Vec::new()),
        });

        let router = Router::new()
            .route("/api/get-messages", post(get_messages))
            .route("/api/get-chats", get(get_chats))
            .route("/api/unread-messages", get(unread_messages))
            .route("/api/auth/status", get(auth_status))
            .route("/api/chat/ws", any(chat_ws))
            .route("/api/notifications/ws", any(notifications_ws))
            .route("/api/chat-notifications/ws", any(unread_ws))
            .with_state(shared.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self {
            addr,
            received,
            shared,
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(format!("http://{}", self.addr)).with_session_cookie(GOOD_COOKIE)
    }

    /// Next frame a client sent, with the path of the socket it came in on.
    pub async fn next_frame(&mut self) -> (&'static str, String) {
        within(self.received.recv())
            .await
            .expect("backend stopped")
    }

    pub fn open_sockets(&self) -> usize {
        self.shared.open_sockets.load(Ordering::SeqCst)
    }

    /// Wait until the number of open server-side sockets equals `n`.
    pub async fn wait_open_sockets(&self, n: usize) {
        within(async {
            while self.open_sockets() != n {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
    }

    pub fn handshake_cookies(&self) -> Vec<Option<String>> {
        self.shared
            .handshake_cookies
            .lock()
            .expect("cookie log poisoned")
            .clone()
    }
}

fn json(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

async fn get_messages(State(shared): State<Arc<Shared>>) -> Response {
    json(
        shared.script.history_status,
        shared.script.history_body.clone(),
    )
}

async fn get_chats() -> Response {
    json(
        StatusCode::OK,
        r#"[{"chat_id":42,"full_name":"Ada Lovelace"},{"chat_id":7,"full_name":"Alan Turing"}]"#
            .to_string(),
    )
}

async fn unread_messages(State(shared): State<Arc<Shared>>) -> Response {
    json(StatusCode::OK, shared.script.unread_body.clone())
}

async fn auth_status(headers: HeaderMap) -> Response {
    if cookie(&headers).as_deref() == Some(GOOD_COOKIE) {
        json(StatusCode::OK, r#"{"isAuthenticated":true}"#.to_string())
    } else {
        json(StatusCode::UNAUTHORIZED, r#"{"error":"unauthorized"}"#.to_string())
    }
}

/// Tracks one server-side socket for its lifetime.
struct OpenGuard(Arc<Shared>);

impl OpenGuard {
    fn new(shared: Arc<Shared>, headers: &HeaderMap) -> Self {
        shared
            .handshake_cookies
            .lock()
            .expect("cookie log poisoned")
            .push(cookie(headers));
        shared.open_sockets.fetch_add(1, Ordering::SeqCst);
        Self(shared)
    }
}

impl Drop for OpenGuard {
    fn drop(&mut self) {
        self.0.open_sockets.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn push(socket: &mut WebSocket, frames: &[String]) -> bool {
    for frame in frames {
        if socket
            .send(Message::Text(frame.clone().into()))
            .await
            .is_err()
        {
            return false;
        }
    }
    true
}

async fn chat_ws(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(shared): State<Arc<Shared>>,
) -> Response {
    let guard = OpenGuard::new(shared.clone(), &headers);
    ws.on_upgrade(move |socket| chat_socket(socket, shared, guard))
}

async fn chat_socket(mut socket: WebSocket, shared: Arc<Shared>, _guard: OpenGuard) {
    let mut subscribed = false;
    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else {
            continue;
        };
        let text = text.to_string();
        let _ = shared.frames.send(("/api/chat/ws", text.clone()));

        if !subscribed {
            subscribed = true;
            if !push(&mut socket, &shared.script.chat_push).await {
                return;
            }
            match &shared.script.chat_ending {
                ChatEnding::Stay => {}
                ChatEnding::Close(reason) => {
                    let frame = CloseFrame {
                        code: 1000,
                        reason: reason.clone().into(),
                    };
                    let _ = socket.send(Message::Close(Some(frame))).await;
                    // Wait for the client to answer the close
                    while let Some(Ok(_)) = socket.recv().await {}
                    return;
                }
                ChatEnding::Drop => return,
            }
        } else if shared.script.echo_chat && !push(&mut socket, &[text]).await {
            return;
        }
    }
}

async fn notifications_ws(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(shared): State<Arc<Shared>>,
) -> Response {
    let guard = OpenGuard::new(shared.clone(), &headers);
    ws.on_upgrade(move |socket| {
        let frames = shared.script.notification_push.clone();
        record_socket(socket, shared, guard, "/api/notifications/ws", frames)
    })
}

async fn unread_ws(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(shared): State<Arc<Shared>>,
) -> Response {
    let guard = OpenGuard::new(shared.clone(), &headers);
    ws.on_upgrade(move |socket| {
        let frames = shared.script.unread_push.clone();
        record_socket(socket, shared, guard, "/api/chat-notifications/ws", frames)
    })
}

async fn record_socket(
    mut socket: WebSocket,
    shared: Arc<Shared>,
    _guard: OpenGuard,
    path: &'static str,
    frames: Vec<String>,
) {
    if !push(&mut socket, &frames).await {
        return;
    }
    while let Some(Ok(message)) = socket.recv().await {
        if let Message::Text(text) = message {
            let _ = shared.frames.send((path, text.to_string()));
        }
    }
}
