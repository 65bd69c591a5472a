use bookhub_core::auth::CallbackTokens;
use chrono::Utc;
use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::JsValue;

use crate::api;
use crate::components::auth_panel::AuthPanel;
use crate::components::create_post::CreatePost;
use crate::components::explorer_panel::ExplorerPanel;
use crate::components::post_detail::PostDetail;
use crate::components::posts_panel::PostsPanel;
use crate::components::profile_panel::ProfilePanel;
use crate::state::{AppState, View};
use crate::storage;

/// Фрагмент OAuth-колбэка из адресной строки; сам фрагмент убирается из URL.
fn take_oauth_fragment() -> Option<String> {
    let window = web_sys::window()?;
    let hash = window.location().hash().ok()?;
    if !CallbackTokens::is_callback_fragment(&hash) {
        return None;
    }

    let path = window.location().pathname().unwrap_or_else(|_| "/".to_string());
    if let Ok(history) = window.history() {
        if let Err(err) = history.replace_state_with_url(&JsValue::NULL, "", Some(&path)) {
            web_sys::console::warn_1(&err);
        }
    }
    Some(hash)
}

fn complete_oauth(state: AppState, fragment: String) {
    let tokens = match CallbackTokens::from_fragment(&fragment) {
        Ok(tokens) => tokens,
        Err(err) => {
            state.set_error(err.to_string());
            return;
        }
    };

    state.loading.set(true);
    spawn_local(async move {
        match api::get_user(&tokens.access_token).await {
            Ok(user) => {
                state.sign_in(tokens.into_session(user, Utc::now()));
                state.navigate(View::Home);
            }
            Err(err) => state.set_error(err.to_string()),
        }
        state.loading.set(false);
    });
}

fn sign_out(state: AppState) {
    let token = state.token();
    state.sign_out_locally();
    state.navigate(View::Home);
    if let Some(token) = token {
        spawn_local(async move {
            if let Err(err) = api::sign_out(&token).await {
                web_sys::console::warn_1(&JsValue::from_str(&err.to_string()));
            }
        });
    }
}

#[component]
pub fn App() -> impl IntoView {
    let state = AppState::new();

    if let Some(session) = storage::load_session() {
        let expiring = session.expires_soon(Utc::now());
        state.session.set(Some(session));
        if expiring {
            let state = state.clone();
            spawn_local(async move {
                state.fresh_session().await;
            });
        }
    }
    if let Some(fragment) = take_oauth_fragment() {
        complete_oauth(state.clone(), fragment);
    }

    let nav = Callback::new({
        let state = state.clone();
        move |view: View| state.navigate(view)
    });
    let on_sign_out = Callback::new({
        let state = state.clone();
        move |_: ()| sign_out(state.clone())
    });
    let session = state.session;
    let loading = state.loading;
    let error = state.error;
    let notice = state.notice;

    let avatar = {
        let state = state.clone();
        move || {
            state
                .user()
                .map(|user| format!("{} {}", user.initial(), user.display_name()))
                .unwrap_or_default()
        }
    };

    let page = {
        let state = state.clone();
        move || match state.view.get() {
            View::Home => view! { <PostsPanel state=state.clone() /> }.into_any(),
            View::Explore => view! { <ExplorerPanel state=state.clone() /> }.into_any(),
            View::CreatePost => view! { <CreatePost state=state.clone() /> }.into_any(),
            View::Post(id) => view! { <PostDetail state=state.clone() post_id=id /> }.into_any(),
            View::Profile => view! { <ProfilePanel state=state.clone() /> }.into_any(),
            View::Auth => view! { <AuthPanel state=state.clone() /> }.into_any(),
        }
    };

    view! {
        <main class="page">
            <header class="navbar">
                <h1 class="brand" on:click=move |_| nav.run(View::Home)>"BookHub"</h1>
                <nav>
                    <button on:click=move |_| nav.run(View::Home)>"Home"</button>
                    <button on:click=move |_| nav.run(View::Explore)>"Explore Books"</button>
                    <Show
                        when=move || session.with(Option::is_some)
                        fallback=move || view! {
                            <button on:click=move |_| nav.run(View::Auth)>"Sign In"</button>
                        }
                    >
                        <button on:click=move |_| nav.run(View::CreatePost)>"Create Post"</button>
                        <button on:click=move |_| nav.run(View::Profile)>"Profile"</button>
                        <span class="avatar">{avatar.clone()}</span>
                        <button
                            on:click=move |_| on_sign_out.run(())
                            disabled=move || loading.get()
                        >
                            "Sign Out"
                        </button>
                    </Show>
                </nav>
            </header>

            <section class="container">
                <Show when=move || error.with(Option::is_some)>
                    <div class="error-banner">
                        <strong>"Error: "</strong>
                        {move || error.get().unwrap_or_default()}
                    </div>
                </Show>
                <Show when=move || notice.with(Option::is_some)>
                    <div class="notice-banner">
                        {move || notice.get().unwrap_or_default()}
                    </div>
                </Show>

                {page}
            </section>
        </main>
    }
}
