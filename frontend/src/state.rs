use leptos::prelude::*;
use leptos::task::spawn_local;
use web_sys::WebSocket;

use crate::api;
use crate::models::{Message, Room, UserInfo, WsEvent};
use crate::ws;

/// Shared application state, provided via Leptos context.
///
/// Holds the authenticated identity, the selected room, and everything the
/// live feeds write into. The feeds are the single source of truth for rooms
/// and messages: nothing is inserted optimistically.
#[derive(Clone)]
pub struct AppState {
    // --- Read signals (for components to subscribe to) ---
    pub user: ReadSignal<Option<UserInfo>>,
    pub token: ReadSignal<Option<String>>,
    pub rooms: ReadSignal<Vec<Room>>,
    pub active_room: ReadSignal<Option<(String, String)>>,
    pub messages: ReadSignal<Vec<Message>>,
    pub streaming_text: ReadSignal<Option<String>>,
    pub is_streaming: ReadSignal<bool>,
    pub error: ReadSignal<Option<String>>,

    // --- Write signals (for mutating state) ---
    pub set_user: WriteSignal<Option<UserInfo>>,
    pub set_token: WriteSignal<Option<String>>,
    pub set_rooms: WriteSignal<Vec<Room>>,
    pub set_active_room: WriteSignal<Option<(String, String)>>,
    pub set_messages: WriteSignal<Vec<Message>>,
    pub set_streaming_text: WriteSignal<Option<String>>,
    pub set_is_streaming: WriteSignal<bool>,
    pub set_error: WriteSignal<Option<String>>,

    // --- Live feed handles (closed before re-subscribing) ---
    rooms_ws: StoredValue<Option<WebSocket>, LocalStorage>,
    room_ws: StoredValue<Option<WebSocket>, LocalStorage>,
}

impl AppState {
    /// Create a new `AppState` and provide it in the current Leptos context.
    pub fn provide() -> Self {
        let (user, set_user) = signal(None::<UserInfo>);
        let (token, set_token) = signal(None::<String>);
        let (rooms, set_rooms) = signal(Vec::<Room>::new());
        let (active_room, set_active_room) = signal(None::<(String, String)>);
        let (messages, set_messages) = signal(Vec::<Message>::new());
        let (streaming_text, set_streaming_text) = signal(None::<String>);
        let (is_streaming, set_is_streaming) = signal(false);
        let (error, set_error) = signal(None::<String>);

        let state = Self {
            user,
            token,
            rooms,
            active_room,
            messages,
            streaming_text,
            is_streaming,
            error,
            set_user,
            set_token,
            set_rooms,
            set_active_room,
            set_messages,
            set_streaming_text,
            set_is_streaming,
            set_error,
            rooms_ws: StoredValue::new_local(None),
            room_ws: StoredValue::new_local(None),
        };

        provide_context(state.clone());
        state
    }

    /// Adopt a fresh identity and open its room-list feed. Called after a
    /// successful login or registration.
    pub fn sign_in(&self, token: String, user: UserInfo) {
        self.set_token.set(Some(token));
        self.set_user.set(Some(user));
        self.set_error.set(None);
        self.open_rooms_feed();
    }

    /// Explicit sign-out: tell the backend to close the session, then drop
    /// the identity locally.
    pub fn sign_out(&self) {
        if let Some(token) = self.token.get_untracked() {
            spawn_local(async move {
                if let Err(e) = api::logout(&token).await {
                    log::warn!("Logout request failed: {e}");
                }
            });
        }
        self.drop_identity();
    }

    /// Drop the identity: close every live feed, clear all state. The UI
    /// reacts by swapping back to the sign-in screen. Used directly (without
    /// a logout round-trip) when the backend already rejected the token.
    pub fn drop_identity(&self) {
        self.close_feed(&self.rooms_ws);
        self.close_feed(&self.room_ws);

        self.set_token.set(None);
        self.set_user.set(None);
        self.set_rooms.set(Vec::new());
        self.set_active_room.set(None);
        self.set_messages.set(Vec::new());
        self.set_streaming_text.set(None);
        self.set_is_streaming.set(false);
        self.set_error.set(None);
    }

    /// Asks the backend whether the token is still accepted; if not, the
    /// identity is dropped. Called after feed connection errors, which the
    /// browser reports without a status: an expired session and a flaky link
    /// look identical until a REST call tells them apart.
    fn verify_session(&self) {
        let Some(token) = self.token.get_untracked() else {
            return;
        };
        let state = self.clone();
        spawn_local(async move {
            if let Err(api::ApiError::Unauthorized) = api::list_rooms(&token).await {
                log::warn!("Session no longer accepted; returning to sign-in");
                state.drop_identity();
            }
        });
    }

    /// Select a room: the previous room feed is closed *before* the new one
    /// opens, so no update for the old room can reach the new view.
    pub fn select_room(&self, id: String, name: String) {
        self.close_feed(&self.room_ws);

        self.set_active_room.set(Some((id.clone(), name)));
        self.set_messages.set(Vec::new());
        self.set_streaming_text.set(None);
        self.set_is_streaming.set(false);
        self.set_error.set(None);

        let Some(token) = self.token.get_untracked() else {
            return;
        };

        let set_messages = self.set_messages;
        let set_streaming = self.set_streaming_text;
        let set_is_streaming = self.set_is_streaming;
        let set_error = self.set_error;

        let on_event = move |event: WsEvent| match event {
            WsEvent::Snapshot { messages } => {
                // Full replace in creation order; the feed is authoritative.
                set_messages.set(messages);
            }
            WsEvent::StreamStart => {
                set_is_streaming.set(true);
                set_streaming.set(Some(String::new()));
            }
            WsEvent::StreamChunk { content } => {
                set_streaming.update(|current| {
                    if let Some(text) = current {
                        text.push_str(&content);
                    }
                });
            }
            WsEvent::StreamEnd { .. } => {
                // The persisted reply arrives through the snapshot; only the
                // transient buffer is cleared here.
                set_streaming.set(None);
                set_is_streaming.set(false);
            }
            WsEvent::Error { message } => {
                log::error!("Room feed error: {message}");
                set_error.set(Some(message));
                set_streaming.set(None);
                set_is_streaming.set(false);
            }
            WsEvent::Rooms { .. } => {}
        };

        let conn_state = self.clone();
        let on_connection_error = move || {
            conn_state.set_error.set(Some("Connection error on the live feed".to_string()));
            conn_state.set_streaming_text.set(None);
            conn_state.set_is_streaming.set(false);
            conn_state.verify_session();
        };

        self.room_ws.set_value(ws::connect(
            &api::room_ws_url(&id, &token),
            on_event,
            on_connection_error,
        ));
    }

    /// Deselect any room (the "new chat" affordance).
    pub fn clear_room(&self) {
        self.close_feed(&self.room_ws);
        self.set_active_room.set(None);
        self.set_messages.set(Vec::new());
        self.set_streaming_text.set(None);
        self.set_is_streaming.set(false);
        self.set_error.set(None);
    }

    /// Send a message on the active room's socket. Empty input or a missing
    /// room selection is a no-op; a send already in flight blocks another.
    pub fn send_message(&self, text: String) {
        let text = text.trim().to_string();
        if text.is_empty() || self.is_streaming.get_untracked() {
            return;
        }
        if self.active_room.get_untracked().is_none() {
            return;
        }

        let sent = self.room_ws.with_value(|ws| match ws {
            Some(ws) => ws::send_frame(ws, &text),
            None => Err("No live feed open for this room".to_string()),
        });

        match sent {
            Ok(()) => {
                self.set_is_streaming.set(true);
                self.set_streaming_text.set(Some(String::new()));
                self.set_error.set(None);
            }
            Err(e) => self.set_error.set(Some(e)),
        }
    }

    fn open_rooms_feed(&self) {
        self.close_feed(&self.rooms_ws);

        let Some(token) = self.token.get_untracked() else {
            return;
        };

        let set_rooms = self.set_rooms;
        let set_error = self.set_error;
        let on_event = move |event: WsEvent| match event {
            WsEvent::Rooms { rooms } => set_rooms.set(rooms),
            WsEvent::Error { message } => {
                log::error!("Room-list feed error: {message}");
                set_error.set(Some(message));
            }
            _ => {}
        };

        let conn_state = self.clone();
        let on_connection_error = move || {
            conn_state.set_error.set(Some("Connection error on the live feed".to_string()));
            conn_state.verify_session();
        };

        self.rooms_ws.set_value(ws::connect(
            &api::rooms_ws_url(&token),
            on_event,
            on_connection_error,
        ));
    }

    fn close_feed(&self, handle: &StoredValue<Option<WebSocket>, LocalStorage>) {
        handle.update_value(|ws| {
            if let Some(ws) = ws.take() {
                ws::close(&ws);
            }
        });
    }
}
