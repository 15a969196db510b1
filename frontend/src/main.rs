mod api;
mod components;
mod models;
mod state;
mod ws;

use leptos::mount::mount_to_body;
use leptos::prelude::*;

use components::auth::AuthPage;
use components::chat::ChatArea;
use components::sidebar::Sidebar;
use state::AppState;

/// Root application component. With no identity the auth screen is the only
/// thing rendered, so conversation data can never load while signed out.
#[component]
fn App() -> impl IntoView {
    let state = AppState::provide();

    view! {
        {move || {
            if state.user.get().is_some() {
                view! {
                    <div class="app-container">
                        <Sidebar />
                        <ChatArea />
                    </div>
                }.into_any()
            } else {
                view! { <AuthPage /> }.into_any()
            }
        }}
    }
}

fn main() {
    console_log::init_with_level(log::Level::Debug).expect("Failed to init logger");
    mount_to_body(App);
}
