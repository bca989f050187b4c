//! Native/Desktop WebSocket implementation using tokio-tungstenite.

use std::time::Duration;

use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{header::COOKIE, HeaderValue};
use tokio_tungstenite::tungstenite::Message;

use super::{ConnectRequest, EventSender, TransportEvent};
use crate::error::ChannelError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// One live socket, driven by a background tokio task.
///
/// Dropping or closing the handle ends the task, which performs the closing
/// handshake if the socket got as far as opening.
pub(crate) struct Connection {
    outbound: UnboundedSender<String>,
}

impl Connection {
    /// Queue a text frame for the writer.
    pub fn send(&self, text: String) -> Result<(), ChannelError> {
        self.outbound
            .unbounded_send(text)
            .map_err(|e| ChannelError::Transport(format!("Failed to send: {}", e)))
    }

    pub fn close(self) {
        self.outbound.close_channel();
    }
}

/// Start connecting in a background task. Must be called inside a tokio runtime.
pub(crate) fn open(request: ConnectRequest, events: EventSender) -> Result<Connection, String> {
    let (outbound, outbound_rx) = unbounded();
    tokio::spawn(run_connection(request, outbound_rx, events));
    Ok(Connection { outbound })
}

fn build_request(endpoint: &str, session_cookie: Option<&str>) -> Result<Request, String> {
    let mut request = endpoint
        .into_client_request()
        .map_err(|e| format!("Invalid endpoint {}: {}", endpoint, e))?;
    if let Some(cookie) = session_cookie {
        let value =
            HeaderValue::from_str(cookie).map_err(|e| format!("Invalid session cookie: {}", e))?;
        request.headers_mut().insert(COOKIE, value);
    }
    Ok(request)
}

/// Resolves once the owner drops or closes its sender.
async fn closed_by_owner(outbound_rx: &mut UnboundedReceiver<String>) {
    while outbound_rx.next().await.is_some() {}
}

async fn run_connection(
    request: ConnectRequest,
    mut outbound_rx: UnboundedReceiver<String>,
    events: EventSender,
) {
    let ConnectRequest {
        generation,
        endpoint,
        session_cookie,
    } = request;
    let emit = |event: TransportEvent| {
        // The channel may already be gone; nobody is left to tell.
        let _ = events.unbounded_send((generation, event));
    };

    let handshake = match build_request(&endpoint, session_cookie.as_deref()) {
        Ok(handshake) => handshake,
        Err(e) => {
            crate::log_error!("WebSocket error for {}: {}", endpoint, e);
            emit(TransportEvent::Error(e));
            return;
        }
    };

    let ws_stream = tokio::select! {
        result = tokio::time::timeout(CONNECT_TIMEOUT, connect_async(handshake)) => match result {
            Ok(Ok((ws_stream, _response))) => ws_stream,
            Ok(Err(e)) => {
                crate::log_error!("WebSocket error for {}: {}", endpoint, e);
                emit(TransportEvent::Error(e.to_string()));
                return;
            }
            Err(_) => {
                crate::log_error!("WebSocket to {} timed out after {:?}", endpoint, CONNECT_TIMEOUT);
                emit(TransportEvent::Error("Connection timeout".to_string()));
                return;
            }
        },
        _ = closed_by_owner(&mut outbound_rx) => {
            crate::log_debug!("Connection #{} to {} closed before it opened", generation, endpoint);
            return;
        }
    };

    crate::log_info!("WebSocket connected to {}", endpoint);
    emit(TransportEvent::Open);

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            outbound = outbound_rx.next() => match outbound {
                Some(text) => {
                    if let Err(e) = write.send(Message::text(text)).await {
                        crate::log_error!("Send to {} failed: {}", endpoint, e);
                        emit(TransportEvent::Error(e.to_string()));
                        break;
                    }
                }
                None => {
                    if let Err(e) = write.close().await {
                        crate::log_debug!("Closing handshake with {} failed: {}", endpoint, e);
                    }
                    crate::log_info!("WebSocket to {} closed by client", endpoint);
                    break;
                }
            },
            inbound = read.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    crate::log_debug!("WebSocket received: {}", text.as_str());
                    emit(TransportEvent::Text(text.as_str().to_owned()));
                }
                Some(Ok(Message::Binary(_))) => {
                    crate::log_warn!("Ignoring binary frame from {}", endpoint);
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.as_str().to_owned())
                        .filter(|r| !r.is_empty());
                    crate::log_info!("WebSocket to {} received close frame", endpoint);
                    emit(TransportEvent::Closed { reason });
                    break;
                }
                Some(Ok(_)) => {
                    // Ping/pong are answered by tungstenite
                }
                Some(Err(e)) => {
                    crate::log_error!("WebSocket read error from {}: {}", endpoint, e);
                    emit(TransportEvent::Error(e.to_string()));
                    break;
                }
                None => {
                    emit(TransportEvent::Closed { reason: None });
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_carries_session_cookie() {
        let request =
            build_request("ws://localhost:8000/api/chat/ws", Some("session_token=abc")).unwrap();
        assert_eq!(request.uri().path(), "/api/chat/ws");
        assert_eq!(
            request.headers().get(COOKIE).and_then(|v| v.to_str().ok()),
            Some("session_token=abc")
        );
    }

    #[test]
    fn handshake_rejects_non_websocket_endpoint() {
        assert!(build_request("not a url", None).is_err());
    }
}
