//! Web (WASM) WebSocket implementation using the browser's `WebSocket`.
//!
//! The browser attaches the session cookie to the handshake itself, so
//! `ConnectRequest::session_cookie` is not used here.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{js_sys, CloseEvent, Event, MessageEvent, WebSocket};

use super::{ConnectRequest, EventSender, TransportEvent};
use crate::error::ChannelError;

/// One browser socket plus the callbacks that forward its events.
///
/// The callbacks live exactly as long as the connection and are detached on close.
pub(crate) struct Connection {
    socket: WebSocket,
    _onopen: Closure<dyn FnMut(Event)>,
    _onmessage: Closure<dyn FnMut(MessageEvent)>,
    _onerror: Closure<dyn FnMut(Event)>,
    _onclose: Closure<dyn FnMut(CloseEvent)>,
}

impl Connection {
    pub fn send(&self, text: String) -> Result<(), ChannelError> {
        // readyState 1 = OPEN
        if self.socket.ready_state() != WebSocket::OPEN {
            return Err(ChannelError::Transport(
                "WebSocket no longer open".to_string(),
            ));
        }
        self.socket
            .send_with_str(&text)
            .map_err(|e| ChannelError::Transport(format!("Send failed: {:?}", e)))
    }

    pub fn close(self) {
        self.socket.set_onopen(None);
        self.socket.set_onmessage(None);
        self.socket.set_onerror(None);
        self.socket.set_onclose(None);
        if let Err(e) = self.socket.close() {
            crate::log_debug!("WebSocket close failed: {:?}", e);
        }
    }
}

/// Create the browser socket and wire its callbacks to `events`.
pub(crate) fn open(request: ConnectRequest, events: EventSender) -> Result<Connection, String> {
    let ConnectRequest {
        generation,
        endpoint,
        ..
    } = request;

    let socket = WebSocket::new(&endpoint)
        .map_err(|e| format!("Failed to create WebSocket: {:?}", e))?;

    let tx = events.clone();
    let onopen = Closure::wrap(Box::new(move |_: Event| {
        let _ = tx.unbounded_send((generation, TransportEvent::Open));
    }) as Box<dyn FnMut(Event)>);
    socket.set_onopen(Some(onopen.as_ref().unchecked_ref()));

    let tx = events.clone();
    let onmessage = Closure::wrap(Box::new(move |e: MessageEvent| {
        match e.data().dyn_into::<js_sys::JsString>() {
            Ok(text) => {
                let text: String = text.into();
                let _ = tx.unbounded_send((generation, TransportEvent::Text(text)));
            }
            Err(_) => crate::log_warn!("Ignoring binary frame"),
        }
    }) as Box<dyn FnMut(MessageEvent)>);
    socket.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));

    let tx = events.clone();
    let onerror = Closure::wrap(Box::new(move |_: Event| {
        crate::log_error!("WebSocket onerror fired");
        let _ = tx.unbounded_send((generation, TransportEvent::Error("WebSocket error".to_string())));
    }) as Box<dyn FnMut(Event)>);
    socket.set_onerror(Some(onerror.as_ref().unchecked_ref()));

    let tx = events;
    let onclose = Closure::wrap(Box::new(move |e: CloseEvent| {
        let reason = if e.reason().is_empty() {
            None
        } else {
            Some(e.reason())
        };
        crate::log_info!("WebSocket onclose: code {}", e.code());
        let _ = tx.unbounded_send((generation, TransportEvent::Closed { reason }));
    }) as Box<dyn FnMut(CloseEvent)>);
    socket.set_onclose(Some(onclose.as_ref().unchecked_ref()));

    Ok(Connection {
        socket,
        _onopen: onopen,
        _onmessage: onmessage,
        _onerror: onerror,
        _onclose: onclose,
    })
}
