use bookhub_core::{Post, PostQuery, SortKey};
use leptos::prelude::*;
use leptos::task::spawn_local;
use uuid::Uuid;

use crate::api;
use crate::components::post_card::PostCard;
use crate::display::{empty_message, sort_label};
use crate::state::{AppState, View};

/// Загружает ленту; ответ устаревшего запроса отбрасывается.
fn load_posts(state: AppState, query: PostQuery, posts: RwSignal<Vec<Post>>, busy: RwSignal<bool>) {
    let ticket = state.feed_seq.begin();
    busy.set(true);
    state.clear_error();

    spawn_local(async move {
        let result = api::list_posts(&query).await;
        if !state.feed_seq.is_current(ticket) {
            return;
        }
        match result {
            Ok(list) => posts.set(list),
            Err(err) => state.set_error(err.to_string()),
        }
        busy.set(false);
    });
}

#[component]
pub(crate) fn PostsPanel(state: AppState) -> impl IntoView {
    let query = RwSignal::new(PostQuery::default());
    let posts = RwSignal::new(Vec::<Post>::new());
    let busy = RwSignal::new(false);

    Effect::new({
        let state = state.clone();
        move |_| load_posts(state.clone(), query.get(), posts, busy)
    });

    let on_open = Callback::new({
        let state = state.clone();
        move |id: Uuid| state.navigate(View::Post(id))
    });

    let sort_button = move |key: SortKey| {
        view! {
            <button
                class:active=move || query.with(|q| q.sort == key)
                on:click=move |_| query.update(|q| q.toggle_sort(key))
            >
                {move || query.with(|q| sort_label(q, key))}
            </button>
        }
    };

    view! {
        <h2>"Book Discussions"</h2>
        <div class="feed-controls">
            <input
                type="search"
                placeholder="Search posts by title..."
                prop:value=move || query.with(|q| q.search.clone())
                on:input=move |ev| {
                    let value = event_target_value(&ev);
                    query.update(|q| q.search = value);
                }
            />
            {sort_button(SortKey::CreatedAt)}
            {sort_button(SortKey::Upvotes)}
        </div>

        <Show when=move || busy.get()>
            <p class="loading">"Loading posts..."</p>
        </Show>
        <Show when=move || !busy.get() && posts.with(Vec::is_empty)>
            <p class="empty">{move || query.with(empty_message)}</p>
        </Show>

        <div class="post-list">
            <For
                each=move || posts.get()
                key=|post| (post.id, post.upvotes, post.title.clone())
                children=move |post| view! { <PostCard post=post on_open=on_open /> }
            />
        </div>
    }
}
