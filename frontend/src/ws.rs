use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{MessageEvent, WebSocket};

use crate::models::{SendFrame, WsEvent};

/// Opens a WebSocket and dispatches every server event to `on_event`.
/// The caller owns the returned handle; closing it releases the feed.
///
/// Connection-level failures go to `on_connection_error` instead: the
/// browser hides the reason (a rejected upgrade looks the same as a dropped
/// link), so the caller decides whether the session itself is still good.
pub fn connect(
    url: &str,
    on_event: impl Fn(WsEvent) + Clone + 'static,
    on_connection_error: impl Fn() + 'static,
) -> Option<WebSocket> {
    let ws = match WebSocket::new(url) {
        Ok(ws) => ws,
        Err(e) => {
            log::error!("Failed to open WebSocket: {e:?}");
            on_connection_error();
            return None;
        }
    };
    ws.set_binary_type(web_sys::BinaryType::Arraybuffer);

    // --- onmessage: parse and dispatch WsEvent ---
    let on_message_event = on_event.clone();
    let onmessage = Closure::<dyn Fn(MessageEvent)>::new(move |ev: MessageEvent| {
        if let Some(text) = ev.data().as_string() {
            match serde_json::from_str::<WsEvent>(&text) {
                Ok(event) => on_message_event(event),
                Err(e) => on_message_event(WsEvent::Error {
                    message: format!("Parse error: {e}"),
                }),
            }
        }
    });
    ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
    onmessage.forget();

    // --- onerror: hand off so the UI never hangs in loading ---
    let onerror = Closure::<dyn Fn()>::new(move || {
        log::error!("WebSocket connection error");
        on_connection_error();
    });
    ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onerror.forget();

    Some(ws)
}

/// Sends a chat frame on an open room socket.
pub fn send_frame(ws: &WebSocket, message: &str) -> Result<(), String> {
    if ws.ready_state() != WebSocket::OPEN {
        return Err("Live feed is not connected yet".to_string());
    }
    let frame = SendFrame { message: message.to_string() };
    let json = serde_json::to_string(&frame).map_err(|e| format!("Serialize error: {e}"))?;
    ws.send_with_str(&json)
        .map_err(|e| format!("Send failed: {e:?}"))
}

/// Close a WebSocket connection gracefully.
pub fn close(ws: &WebSocket) {
    let _ = ws.close();
}
