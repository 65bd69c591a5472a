use bookhub_core::Post;
use leptos::prelude::*;
use leptos::task::spawn_local;
use uuid::Uuid;

use crate::api;
use crate::components::post_card::PostCard;
use crate::state::{AppState, View};

#[component]
pub(crate) fn ProfilePanel(state: AppState) -> impl IntoView {
    let posts = RwSignal::new(Vec::<Post>::new());
    let busy = RwSignal::new(false);

    if let Some(user) = state.user() {
        busy.set(true);
        let state = state.clone();
        spawn_local(async move {
            match api::posts_by_user(&user.id).await {
                Ok(list) => posts.set(list),
                Err(err) => state.set_error(err.to_string()),
            }
            busy.set(false);
        });
    }

    let on_open = Callback::new({
        let state = state.clone();
        move |id: Uuid| state.navigate(View::Post(id))
    });
    let to_auth = Callback::new({
        let state = state.clone();
        move |_: ()| state.navigate(View::Auth)
    });
    let session = state.session;

    let header = move || {
        session.get().map(|session| {
            let user = session.user;
            view! {
                <div class="profile-header">
                    <span class="avatar large">{user.initial().to_string()}</span>
                    <div>
                        <h2>{user.display_name()}</h2>
                        {user.email.clone().map(|email| view! { <p class="email">{email}</p> })}
                    </div>
                </div>
            }
        })
    };

    view! {
        <Show
            when=move || session.with(Option::is_some)
            fallback=move || view! {
                <p>"Please sign in to view your profile."</p>
                <button on:click=move |_| to_auth.run(())>"Sign In"</button>
            }
        >
            {header}
            <h3>{move || format!("My Posts ({})", posts.with(Vec::len))}</h3>
            <Show when=move || busy.get()>
                <p class="loading">"Loading your posts..."</p>
            </Show>
            <Show when=move || !busy.get() && posts.with(Vec::is_empty)>
                <p class="empty">"You haven't created any posts yet."</p>
            </Show>
            <div class="post-list">
                <For
                    each=move || posts.get()
                    key=|post| post.id
                    children=move |post| view! { <PostCard post=post on_open=on_open /> }
                />
            </div>
        </Show>
    }
}
