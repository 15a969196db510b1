use leptos::ev;
use leptos::html;
use leptos::prelude::*;

use crate::state::AppState;

/// Main chat area: live message history, streaming display, and input.
#[component]
pub fn ChatArea() -> impl IntoView {
    let state = expect_context::<AppState>();

    let scroll_ref = NodeRef::<html::Div>::new();

    // Pin the view to the newest entry whenever the history or the
    // streaming buffer grows.
    let scroll_state = state.clone();
    Effect::new(move |_| {
        scroll_state.messages.track();
        scroll_state.streaming_text.track();
        if let Some(el) = scroll_ref.get() {
            el.set_scroll_top(el.scroll_height());
        }
    });

    let header_state = state.clone();
    let error_state = state.clone();
    let dismiss_state = state.clone();

    view! {
        <main class="chat-area">
            // Error banner: shown on any feed or completion failure; input
            // stays enabled so resubmitting is the retry.
            {move || {
                error_state.error.get().map(|err| {
                    let dismiss = dismiss_state.clone();
                    view! {
                        <div class="error-banner">
                            <span>{err}</span>
                            <button on:click=move |_| dismiss.set_error.set(None)>"✕"</button>
                        </div>
                    }
                })
            }}

            // Chat header
            <div class="chat-header">
                {move || {
                    match header_state.active_room.get() {
                        Some((_, name)) => name,
                        None => "Select a room".to_string(),
                    }
                }}
            </div>

            // Messages
            <div class="messages-container" node_ref=scroll_ref>
                {move || {
                    if state.active_room.get().is_none() {
                        return view! {
                            <div class="empty-state">
                                "Pick a room or create one to start chatting"
                            </div>
                        }.into_any();
                    }

                    let msgs = state.messages.get();
                    if msgs.is_empty() && state.streaming_text.get().is_none() {
                        view! {
                            <div class="empty-state">
                                "Send a message to start chatting"
                            </div>
                        }.into_any()
                    } else {
                        let each_state = state.clone();
                        let stream_state = state.clone();
                        view! {
                            <For
                                each=move || each_state.messages.get()
                                key=|m| m.id.clone()
                                let:msg
                            >
                                <MessageBubble sender=msg.sender.clone() text=msg.text.clone() />
                            </For>
                            // Streaming reply, rendered apart from persisted
                            // messages until the feed delivers the saved copy.
                            {
                                move || {
                                    stream_state.streaming_text.get().map(|text| {
                                        if text.is_empty() {
                                            view! {
                                                <div class="message bot">
                                                    <div class="typing-indicator">"…"</div>
                                                </div>
                                            }.into_any()
                                        } else {
                                            view! {
                                                <div class="message bot">
                                                    <div class="streaming-cursor">{text}</div>
                                                </div>
                                            }.into_any()
                                        }
                                    })
                                }
                            }
                        }.into_any()
                    }
                }}
            </div>

            // Input area
            <ChatInput />
        </main>
    }
}

/// A single chat message bubble.
#[component]
fn MessageBubble(sender: String, text: String) -> impl IntoView {
    let css_class = if sender == "user" { "message user" } else { "message bot" };

    view! {
        <div class=css_class>
            <div>{text}</div>
        </div>
    }
}

/// Chat input with send button. Empty input is a no-op; a send in flight
/// disables the form until the stream finishes or fails.
#[component]
fn ChatInput() -> impl IntoView {
    let state = expect_context::<AppState>();
    let (input, set_input) = signal(String::new());

    let sending_state = state.clone();
    let is_sending = move || sending_state.is_streaming.get();
    let no_room_state = state.clone();
    let no_room = move || no_room_state.active_room.get().is_none();

    let send_state = state.clone();
    let send = move || {
        let text = input.get_untracked().trim().to_string();
        if text.is_empty()
            || send_state.is_streaming.get_untracked()
            || send_state.active_room.get_untracked().is_none()
        {
            return;
        }
        set_input.set(String::new());
        send_state.send_message(text);
    };

    let send_on_key = send.clone();
    let on_keydown = move |ev: ev::KeyboardEvent| {
        if ev.key() == "Enter" && !ev.shift_key() {
            ev.prevent_default();
            send_on_key();
        }
    };

    let on_submit = move |_| {
        send();
    };

    let is_sending_input = is_sending.clone();
    let is_sending_btn = is_sending.clone();
    let is_sending_label = is_sending.clone();
    let no_room_input = no_room.clone();
    let no_room_btn = no_room.clone();

    view! {
        <div class="input-area">
            <div class="input-row">
                <textarea
                    rows="1"
                    placeholder="Send a message… (Enter to send, Shift+Enter for newline)"
                    prop:value=input
                    on:input=move |ev| {
                        set_input.set(event_target_value(&ev));
                    }
                    on:keydown=on_keydown
                    disabled=move || is_sending_input() || no_room_input()
                />
                <button
                    class="send-btn"
                    on:click=on_submit
                    disabled=move || {
                        is_sending_btn() || no_room_btn() || input.get().trim().is_empty()
                    }
                >
                    {move || if is_sending_label() { "Sending…" } else { "Send" }}
                </button>
            </div>
        </div>
    }
}
