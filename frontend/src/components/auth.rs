use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api;
use crate::state::AppState;

/// Sign-in / sign-up screen. Shown whenever no identity is held; a failed
/// attempt keeps the form as-is so the user can resubmit.
#[component]
pub fn AuthPage() -> impl IntoView {
    let state = expect_context::<AppState>();

    let (is_register, set_is_register) = signal(false);
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (form_error, set_form_error) = signal(None::<String>);
    let (is_busy, set_is_busy) = signal(false);

    let submit = move || {
        let email_val = email.get_untracked().trim().to_string();
        let password_val = password.get_untracked();
        if email_val.is_empty() || password_val.is_empty() || is_busy.get_untracked() {
            return;
        }

        set_form_error.set(None);
        set_is_busy.set(true);

        let state = state.clone();
        let register = is_register.get_untracked();
        spawn_local(async move {
            let result = if register {
                api::register(&email_val, &password_val).await
            } else {
                api::login(&email_val, &password_val).await
            };
            set_is_busy.set(false);
            match result {
                Ok(auth) => state.sign_in(auth.token, auth.user),
                Err(e) => set_form_error.set(Some(e)),
            }
        });
    };

    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        submit();
    };

    view! {
        <div class="auth-page">
            <form class="auth-card" on:submit=on_submit>
                <h1>"Parley"</h1>
                <h2>{move || if is_register.get() { "Create an account" } else { "Sign in" }}</h2>

                {move || {
                    form_error.get().map(|err| {
                        view! { <div class="error-banner">{err}</div> }
                    })
                }}

                <input
                    type="email"
                    placeholder="Email"
                    prop:value=email
                    on:input=move |ev| set_email.set(event_target_value(&ev))
                />
                <input
                    type="password"
                    placeholder="Password"
                    prop:value=password
                    on:input=move |ev| set_password.set(event_target_value(&ev))
                />

                <button
                    type="submit"
                    class="primary-btn"
                    disabled=move || is_busy.get()
                >
                    {move || {
                        if is_busy.get() {
                            "Working…"
                        } else if is_register.get() {
                            "Register"
                        } else {
                            "Log in"
                        }
                    }}
                </button>

                <button
                    type="button"
                    class="link-btn"
                    on:click=move |_| {
                        set_form_error.set(None);
                        set_is_register.update(|v| *v = !*v);
                    }
                >
                    {move || {
                        if is_register.get() {
                            "Already have an account? Sign in"
                        } else {
                            "No account yet? Register"
                        }
                    }}
                </button>
            </form>
        </div>
    }
}
