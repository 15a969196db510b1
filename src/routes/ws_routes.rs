use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::models::{Room, SendFrame, User, WsEvent};
use crate::routes::auth_routes::error_response;
use crate::state::AppState;

/// Browsers cannot set headers on WebSocket upgrades, so the session token
/// rides in the query string instead.
#[derive(Deserialize)]
pub struct WsAuthQuery {
    pub token: String,
}

// ── Room-list feed ────────────────────────────────────────────────────────────

/// GET `/ws/rooms?token=` — live feed of the caller's room list. Sends a full
/// snapshot on connect and again on every change.
pub async fn rooms_ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsAuthQuery>,
    State(state): State<AppState>,
) -> Response {
    let user = match state.auth.authenticate(&params.token).await {
        Ok(u) => u,
        Err(e) => return error_response(&e),
    };
    ws.on_upgrade(move |socket| handle_rooms_socket(socket, state, user))
        .into_response()
}

async fn handle_rooms_socket(mut socket: WebSocket, state: AppState, user: User) {
    info!("Room-list feed opened for user {}", user.id);
    let mut feed = state.feed.subscribe_room_list(&user.id);

    if !push_rooms_snapshot(&mut socket, &state, &user.id).await {
        return;
    }

    loop {
        tokio::select! {
            event = feed.recv() => {
                match event {
                    // Lagged just means we missed intermediate notifications;
                    // the snapshot re-fetch catches us up either way.
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        if !push_rooms_snapshot(&mut socket, &state, &user.id).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        warn!("Room-list feed receive error: {e}");
                        break;
                    }
                }
            }
        }
    }

    info!("Room-list feed closed for user {}", user.id);
}

async fn push_rooms_snapshot(socket: &mut WebSocket, state: &AppState, user_id: &str) -> bool {
    match state.rooms.list(user_id).await {
        Ok(rooms) => send_event(socket, &WsEvent::Rooms { rooms }).await,
        Err(e) => {
            error!("Failed to build room-list snapshot for {user_id}: {e}");
            send_event(socket, &WsEvent::Error { message: e.to_string() }).await
        }
    }
}

// ── Conversation feed + send channel ──────────────────────────────────────────

/// GET `/ws/rooms/{id}?token=` — live message feed of one owned room, plus
/// the send channel for assistant round-trips.
///
/// Server-to-client protocol:
/// 1. `{ "type": "snapshot", "messages": [...] }` on connect and after every
///    change to the room's messages (full replace, creation order).
/// 2. In response to a client `{ "message": "..." }` frame:
///    `stream_start`, then repeated `stream_chunk`, then `stream_end`
///    carrying the persisted assistant message — or `error`, after which the
///    connection is back in the plain subscribed state.
pub async fn room_ws_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    Query(params): Query<WsAuthQuery>,
    State(state): State<AppState>,
) -> Response {
    let user = match state.auth.authenticate(&params.token).await {
        Ok(u) => u,
        Err(e) => return error_response(&e),
    };
    let room = match state.rooms.owned_room(&room_id, &user.id).await {
        Ok(r) => r,
        Err(e) => return error_response(&e),
    };
    ws.on_upgrade(move |socket| handle_room_socket(socket, state, user, room))
        .into_response()
}

async fn handle_room_socket(mut socket: WebSocket, state: AppState, user: User, room: Room) {
    info!("Conversation feed opened: room {} user {}", room.id, user.id);
    let mut feed = state.feed.subscribe_room(&room.id);

    if !push_message_snapshot(&mut socket, &state, &room.id, &user.id).await {
        return;
    }

    loop {
        tokio::select! {
            event = feed.recv() => {
                match event {
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        if !push_message_snapshot(&mut socket, &state, &room.id, &user.id).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            msg = socket.recv() => {
                let text = match msg {
                    Some(Ok(WsMessage::Text(t))) => t.to_string(),
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        warn!("Conversation feed receive error: {e}");
                        break;
                    }
                };

                let frame: SendFrame = match serde_json::from_str(&text) {
                    Ok(f) => f,
                    Err(e) => {
                        send_event(&mut socket, &WsEvent::Error {
                            message: format!("Invalid request: {e}"),
                        }).await;
                        continue;
                    }
                };

                // A send in flight is not cancelable; feed notifications that
                // arrive meanwhile stay queued and are drained right after.
                run_send(&mut socket, &state, &user, &room, frame.message).await;
            }
        }
    }

    info!("Conversation feed closed: room {} user {}", room.id, user.id);
}

/// One assistant round-trip. Every failure path emits an `error` event so the
/// client can always clear its loading state and offer a retry.
async fn run_send(socket: &mut WebSocket, state: &AppState, user: &User, room: &Room, text: String) {
    // Persists the user message first; it reaches the client through the
    // feed snapshot, not through the stream events.
    let ctx = match state.chat.prepare_send(&room.id, &user.id, &text).await {
        Ok(ctx) => ctx,
        Err(e) => {
            send_event(socket, &WsEvent::Error { message: e.to_string() }).await;
            return;
        }
    };

    debug!(
        "Persisted user message {} in room {}",
        ctx.user_message.id, ctx.room_id
    );

    // Push the snapshot containing the user's message before any stream
    // event, so the caller's own turn is visible before the reply forms.
    // The queued broadcast notification will trigger a redundant (harmless)
    // full replace once the send completes.
    push_message_snapshot(socket, state, &room.id, &user.id).await;

    if !send_event(socket, &WsEvent::StreamStart).await {
        return;
    }

    let (tx, mut rx) = tokio::sync::mpsc::channel::<String>(64);
    let agent = state.chat.agent().clone();
    let turns = ctx.turns.clone();
    let stream_handle = tokio::spawn(async move { agent.stream_reply(turns, tx).await });

    // A socket closed mid-stream abandons the reply: the partial text is
    // dropped, never persisted as if complete.
    let Some(full_content) = drain_reply(socket, &mut rx).await else {
        stream_handle.abort();
        warn!("Socket closed mid-stream for room {}; reply abandoned", ctx.room_id);
        return;
    };

    match stream_handle.await {
        Ok(Ok(())) => {
            match state.chat.save_assistant_message(&ctx.room_id, &full_content).await {
                Ok(message) => {
                    send_event(socket, &WsEvent::StreamEnd { message }).await;
                }
                Err(e) => {
                    error!("Failed to save assistant message: {e}");
                    send_event(socket, &WsEvent::Error {
                        message: format!("Failed to save response: {e}"),
                    })
                    .await;
                }
            }
        }
        Ok(Err(e)) => {
            // Partial output is abandoned, never persisted as if complete.
            error!("Completion streaming failed for room {}: {e}", ctx.room_id);
            send_event(socket, &WsEvent::Error { message: e.to_string() }).await;
        }
        Err(e) => {
            error!("Completion task panicked: {e}");
            send_event(socket, &WsEvent::Error {
                message: "Internal error during streaming".to_string(),
            })
            .await;
        }
    }
}

async fn push_message_snapshot(
    socket: &mut WebSocket,
    state: &AppState,
    room_id: &str,
    user_id: &str,
) -> bool {
    match state.chat.messages(room_id, user_id).await {
        Ok(messages) => send_event(socket, &WsEvent::Snapshot { messages }).await,
        Err(e) => {
            error!("Failed to build message snapshot for room {room_id}: {e}");
            send_event(socket, &WsEvent::Error { message: e.to_string() }).await
        }
    }
}

/// Serializes and sends one event; returns false once the socket is gone.
async fn send_event(socket: &mut WebSocket, event: &WsEvent) -> bool {
    match serde_json::to_string(event) {
        Ok(json) => socket.send(WsMessage::Text(json.into())).await.is_ok(),
        Err(e) => {
            error!("Failed to serialize WebSocket event: {e}");
            true
        }
    }
}

/// Where stream events land; `send` reports whether the peer is still there.
trait EventSink {
    async fn send(&mut self, event: &WsEvent) -> bool;
}

impl EventSink for WebSocket {
    async fn send(&mut self, event: &WsEvent) -> bool {
        send_event(self, event).await
    }
}

/// Forwards chunks to the sink as they arrive and concatenates them.
/// Returns `None` once the sink reports the connection gone; the partial
/// reply must then be discarded, not persisted.
async fn drain_reply<S: EventSink>(
    sink: &mut S,
    rx: &mut tokio::sync::mpsc::Receiver<String>,
) -> Option<String> {
    let mut full_content = String::new();
    while let Some(chunk) = rx.recv().await {
        full_content.push_str(&chunk);
        if !sink.send(&WsEvent::StreamChunk { content: chunk }).await {
            return None;
        }
    }
    Some(full_content)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink that accepts a fixed number of events, then reports the
    /// connection closed.
    struct ClosesAfter {
        remaining: usize,
    }

    impl EventSink for ClosesAfter {
        async fn send(&mut self, _event: &WsEvent) -> bool {
            if self.remaining == 0 {
                return false;
            }
            self.remaining -= 1;
            true
        }
    }

    #[tokio::test]
    async fn a_live_connection_drains_the_full_reply() {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<String>(8);
        tx.send("Hel".to_string()).await.unwrap();
        tx.send("lo".to_string()).await.unwrap();
        drop(tx);

        let mut sink = ClosesAfter { remaining: usize::MAX };
        assert_eq!(drain_reply(&mut sink, &mut rx).await, Some("Hello".to_string()));
    }

    #[tokio::test]
    async fn a_connection_closed_mid_stream_abandons_the_reply() {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<String>(8);
        tx.send("Hel".to_string()).await.unwrap();
        tx.send("lo".to_string()).await.unwrap();
        drop(tx);

        let mut sink = ClosesAfter { remaining: 1 };
        // The second chunk hits the dead connection; nothing is returned for
        // persistence.
        assert_eq!(drain_reply(&mut sink, &mut rx).await, None);
    }
}
