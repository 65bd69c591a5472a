use bookhub_core::book::PICKER_PAGE_SIZE;
use bookhub_core::{BookSummary, PostDraft};
use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api;
use crate::state::{AppState, View};

#[component]
pub(crate) fn BookPicker(on_pick: Callback<BookSummary>) -> impl IntoView {
    let term = RwSignal::new(String::new());
    let found = RwSignal::new(Vec::<BookSummary>::new());
    let busy = RwSignal::new(false);
    let error = RwSignal::new(None::<String>);

    let run_search = move || {
        let query = term.get_untracked();
        busy.set(true);
        error.set(None);
        spawn_local(async move {
            match api::search_books(&query, 1, PICKER_PAGE_SIZE).await {
                Ok(page) => found.set(page.books),
                Err(err) => error.set(Some(err.to_string())),
            }
            busy.set(false);
        });
    };

    view! {
        <div class="book-picker">
            <input
                type="search"
                placeholder="Search for a book..."
                prop:value=move || term.get()
                on:input=move |ev| term.set(event_target_value(&ev))
                on:keydown=move |ev| {
                    if ev.key() == "Enter" {
                        ev.prevent_default();
                        run_search();
                    }
                }
            />
            <button type="button" disabled=move || busy.get() on:click=move |_| run_search()>
                {move || if busy.get() { "Searching..." } else { "Search" }}
            </button>
            <Show when=move || error.with(Option::is_some)>
                <p class="field-error">{move || error.get().unwrap_or_default()}</p>
            </Show>
            <ul class="picker-results">
                <For
                    each=move || found.get()
                    key=|book| book.id.clone()
                    children=move |book| {
                        let picked = book.clone();
                        view! {
                            <li on:click=move |_| {
                                on_pick.run(picked.clone());
                                found.set(Vec::new());
                            }>
                                {book.cover_url.clone().map(|url| view! { <img src=url alt="" /> })}
                                <strong>{book.title.clone()}</strong>
                                " · "
                                {book.primary_author().to_string()}
                            </li>
                        }
                    }
                />
            </ul>
        </div>
    }
}

#[component]
pub(crate) fn CreatePost(state: AppState) -> impl IntoView {
    let mut initial = PostDraft::default();
    if let Some(book) = state.pending_book.get_untracked() {
        initial.attach_book(&book);
        state.pending_book.set(None);
    }
    let draft = RwSignal::new(initial);
    let field_error = RwSignal::new(None::<String>);

    let on_pick = Callback::new(move |book: BookSummary| draft.update(|d| d.attach_book(&book)));
    let selected_book = Memo::new(move |_| draft.with(|d| d.book.clone()));

    let on_submit = {
        let state = state.clone();
        move |ev: SubmitEvent| {
            ev.prevent_default();
            field_error.set(None);

            if state.loading.get_untracked() {
                return;
            }
            if !state.is_authenticated() {
                state.set_error("Please sign in to create posts");
                return;
            }
            let validated = match draft.get_untracked().validate() {
                Ok(validated) => validated,
                Err(err) => {
                    field_error.set(Some(err.to_string()));
                    return;
                }
            };

            state.loading.set(true);
            let state = state.clone();
            spawn_local(async move {
                if let Some(session) = state.fresh_session().await {
                    let row = validated.into_insert(&session.user.id, &session.user.display_name());
                    match api::create_post(&session.access_token, &row).await {
                        Ok(post) => state.navigate(View::Post(post.id)),
                        Err(err) => state.set_error(err.to_string()),
                    }
                }
                state.loading.set(false);
            });
        }
    };

    let loading = state.loading;
    let signed_in = state.session;
    let to_auth = Callback::new({
        let state = state.clone();
        move |_: ()| state.navigate(View::Auth)
    });

    view! {
        <h2>"Create a Post"</h2>
        <Show
            when=move || signed_in.with(Option::is_some)
            fallback=move || view! {
                <p>"Please sign in to create posts."</p>
                <button on:click=move |_| to_auth.run(())>"Sign In"</button>
            }
        >
            <form class="post-form" on:submit=on_submit.clone()>
                <label>"Title"</label>
                <input
                    placeholder="What's this discussion about?"
                    prop:value=move || draft.with(|d| d.title.clone())
                    on:input=move |ev| {
                        let value = event_target_value(&ev);
                        draft.update(|d| d.title = value);
                    }
                />
                <Show when=move || field_error.with(Option::is_some)>
                    <p class="field-error">{move || field_error.get().unwrap_or_default()}</p>
                </Show>

                <label>"Content"</label>
                <textarea
                    rows="6"
                    placeholder="Share your thoughts..."
                    prop:value=move || draft.with(|d| d.content.clone())
                    on:input=move |ev| {
                        let value = event_target_value(&ev);
                        draft.update(|d| d.content = value);
                    }
                ></textarea>

                <label>"Image URL (optional)"</label>
                <input
                    placeholder="https://..."
                    prop:value=move || draft.with(|d| d.image_url.clone().unwrap_or_default())
                    on:input=move |ev| {
                        let value = event_target_value(&ev);
                        draft.update(|d| d.image_url = Some(value));
                    }
                />

                <label>"Book (optional)"</label>
                {move || match selected_book.get() {
                    Some(book) => view! {
                        <div class="selected-book">
                            <strong>{book.title}</strong>
                            {book.author.map(|author| view! { <span>" by " {author}</span> })}
                            <button type="button" on:click=move |_| draft.update(|d| d.detach_book())>
                                "Remove"
                            </button>
                        </div>
                    }
                    .into_any(),
                    None => view! { <BookPicker on_pick=on_pick /> }.into_any(),
                }}

                <button type="submit" disabled=move || loading.get()>
                    {move || if loading.get() { "Creating..." } else { "Create Post" }}
                </button>
            </form>
        </Show>
    }
}
