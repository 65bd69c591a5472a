use bookhub_core::auth::{OAuthProvider, SignUpResponse};
use bookhub_core::{Session, SignInForm, SignUpForm};
use chrono::Utc;
use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api;
use crate::state::{AppState, View};

const CONFIRMATION_NOTICE: &str = "Check your email for the confirmation link!";

/// Адрес, на который провайдер вернёт пользователя.
fn redirect_target() -> Option<String> {
    web_sys::window()?.location().origin().ok()
}

#[component]
pub(crate) fn AuthPanel(state: AppState) -> impl IntoView {
    let sign_up_mode = RwSignal::new(false);
    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let confirm_password = RwSignal::new(String::new());
    let username = RwSignal::new(String::new());

    let on_submit = {
        let state = state.clone();
        move |ev: SubmitEvent| {
            ev.prevent_default();
            state.clear_error();

            if sign_up_mode.get_untracked() {
                let form = SignUpForm {
                    email: email.get_untracked(),
                    password: password.get_untracked(),
                    confirm_password: confirm_password.get_untracked(),
                    username: username.get_untracked(),
                };
                let request = match form.validate() {
                    Ok(request) => request,
                    Err(err) => {
                        state.set_error(err.to_string());
                        return;
                    }
                };

                state.loading.set(true);
                let state = state.clone();
                spawn_local(async move {
                    match api::sign_up(&request).await {
                        Ok(SignUpResponse::Session(tokens)) => {
                            state.sign_in(Session::from_token_response(tokens, Utc::now()));
                            state.navigate(View::Home);
                        }
                        Ok(SignUpResponse::PendingConfirmation(_)) => {
                            sign_up_mode.set(false);
                            password.set(String::new());
                            confirm_password.set(String::new());
                            state.notice.set(Some(CONFIRMATION_NOTICE.to_string()));
                        }
                        Err(err) => state.set_error(err.to_string()),
                    }
                    state.loading.set(false);
                });
            } else {
                let form = SignInForm {
                    email: email.get_untracked(),
                    password: password.get_untracked(),
                };
                let grant = match form.validate() {
                    Ok(grant) => grant,
                    Err(err) => {
                        state.set_error(err.to_string());
                        return;
                    }
                };

                state.loading.set(true);
                let state = state.clone();
                spawn_local(async move {
                    match api::sign_in(&grant).await {
                        Ok(tokens) => {
                            state.sign_in(Session::from_token_response(tokens, Utc::now()));
                            state.navigate(View::Home);
                        }
                        Err(err) => state.set_error(err.to_string()),
                    }
                    state.loading.set(false);
                });
            }
        }
    };

    let on_oauth = Callback::new({
        let state = state.clone();
        move |provider: OAuthProvider| {
            let Some(redirect_to) = redirect_target() else {
                state.set_error("Cannot determine the page address");
                return;
            };
            let url = match api::oauth_url(provider, &redirect_to) {
                Ok(url) => url,
                Err(err) => {
                    state.set_error(err.to_string());
                    return;
                }
            };
            let navigated = web_sys::window()
                .map(|window| window.location().set_href(&url).is_ok())
                .unwrap_or(false);
            if !navigated {
                state.set_error(format!("Failed to open {provider} sign in"));
            }
        }
    });

    let toggle_mode = {
        let state = state.clone();
        move |_| {
            sign_up_mode.update(|mode| *mode = !*mode);
            state.clear_error();
        }
    };

    let loading = state.loading;

    view! {
        <div class="auth-panel">
            <h2>{move || if sign_up_mode.get() { "Create an Account" } else { "Welcome Back" }}</h2>

            <form on:submit=on_submit>
                <Show when=move || sign_up_mode.get()>
                    <input
                        placeholder="Username"
                        prop:value=move || username.get()
                        on:input=move |ev| username.set(event_target_value(&ev))
                    />
                </Show>
                <input
                    type="email"
                    placeholder="Email"
                    prop:value=move || email.get()
                    on:input=move |ev| email.set(event_target_value(&ev))
                />
                <input
                    type="password"
                    placeholder="Password"
                    prop:value=move || password.get()
                    on:input=move |ev| password.set(event_target_value(&ev))
                />
                <Show when=move || sign_up_mode.get()>
                    <input
                        type="password"
                        placeholder="Confirm password"
                        prop:value=move || confirm_password.get()
                        on:input=move |ev| confirm_password.set(event_target_value(&ev))
                    />
                </Show>
                <button type="submit" disabled=move || loading.get()>
                    {move || match (loading.get(), sign_up_mode.get()) {
                        (true, _) => "Please wait...",
                        (false, true) => "Sign Up",
                        (false, false) => "Sign In",
                    }}
                </button>
            </form>

            <div class="oauth">
                <p>"Or continue with"</p>
                <button disabled=move || loading.get() on:click=move |_| on_oauth.run(OAuthProvider::Google)>
                    "Google"
                </button>
                <button disabled=move || loading.get() on:click=move |_| on_oauth.run(OAuthProvider::Github)>
                    "GitHub"
                </button>
            </div>

            <button class="link" on:click=toggle_mode>
                {move || if sign_up_mode.get() {
                    "Already have an account? Sign in"
                } else {
                    "Don't have an account? Sign up"
                }}
            </button>
        </div>
    }
}
