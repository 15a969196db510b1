use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api;
use crate::state::AppState;

/// Sidebar: live room list, "new room" affordance, identity footer.
#[component]
pub fn Sidebar() -> impl IntoView {
    let state = expect_context::<AppState>();

    let new_room_state = state.clone();
    let on_new = move |_| {
        // Same out-of-band prompt the original UI used.
        let name = window()
            .prompt_with_message("Room name")
            .ok()
            .flatten()
            .unwrap_or_default();
        if name.trim().is_empty() {
            return;
        }

        let Some(token) = new_room_state.token.get_untracked() else {
            return;
        };
        let state = new_room_state.clone();
        spawn_local(async move {
            match api::create_room(&token, &name).await {
                // The room list itself refreshes through the live feed.
                Ok(room) => state.select_room(room.id, room.name),
                // Expired session: back to the sign-in screen, no alert.
                Err(api::ApiError::Unauthorized) => state.drop_identity(),
                Err(e) => {
                    // Blocking conflict message, exactly like a duplicate name.
                    let _ = window().alert_with_message(&e.to_string());
                }
            }
        });
    };

    let logout_state = state.clone();

    view! {
        <aside class="sidebar">
            <div class="sidebar-header">
                <h2>"Parley"</h2>
                <button class="new-chat-btn" on:click=on_new>
                    "+ New Room"
                </button>
            </div>
            <div class="conversation-list">
                {move || {
                    let rooms = state.rooms.get();
                    if rooms.is_empty() {
                        view! {
                            <div class="list-empty">"No rooms yet"</div>
                        }.into_any()
                    } else {
                        let each_state = state.clone();
                        let row_state = state.clone();
                        view! {
                            <For
                                each=move || each_state.rooms.get()
                                key=|r| r.id.clone()
                                let:room
                            >
                                {
                                    let state_active = row_state.clone();
                                    let state_click = row_state.clone();
                                    let id = room.id.clone();
                                    let name = room.name.clone();
                                    let id_click = id.clone();
                                    let name_click = name.clone();
                                    view! {
                                        <div
                                            class="conversation-item"
                                            class:active=move || {
                                                state_active
                                                    .active_room
                                                    .get()
                                                    .map(|(active_id, _)| active_id == id)
                                                    .unwrap_or(false)
                                            }
                                            on:click=move |_| {
                                                state_click.select_room(id_click.clone(), name_click.clone());
                                            }
                                        >
                                            {name}
                                        </div>
                                    }
                                }
                            </For>
                        }.into_any()
                    }
                }}
            </div>

            <div class="sidebar-footer">
                {move || {
                    logout_state.user.get().map(|user| {
                        view! { <div class="user-email">{user.email}</div> }
                    })
                }}
                <button
                    class="logout-btn"
                    on:click={
                        let state = logout_state.clone();
                        move |_| state.sign_out()
                    }
                >
                    "Log out"
                </button>
            </div>
        </aside>
    }
}
