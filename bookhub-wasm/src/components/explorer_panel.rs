use bookhub_core::book::{
    DEFAULT_EXPLORE_QUERY, EXPLORER_PAGE_SIZE, OPEN_LIBRARY_URL, is_works_key, open_library_url,
};
use bookhub_core::{BookDetails, BookSummary, SearchPage};
use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api;
use crate::components::log_warning;
use crate::display::{page_label, subjects_toggle_label};
use crate::state::{AppState, View};

fn search(state: AppState, term: String, page: u32, results: RwSignal<Option<SearchPage>>, busy: RwSignal<bool>) {
    let ticket = state.search_seq.begin();
    busy.set(true);
    state.clear_error();

    spawn_local(async move {
        let result = api::search_books(&term, page, EXPLORER_PAGE_SIZE).await;
        if !state.search_seq.is_current(ticket) {
            return;
        }
        match result {
            Ok(found) => results.set(Some(found)),
            Err(err) => state.set_error(err.to_string()),
        }
        busy.set(false);
    });
}

#[component]
pub(crate) fn ExplorerPanel(state: AppState) -> impl IntoView {
    let term = RwSignal::new(DEFAULT_EXPLORE_QUERY.to_string());
    let submitted = RwSignal::new(DEFAULT_EXPLORE_QUERY.to_string());
    let results = RwSignal::new(None::<SearchPage>);
    let busy = RwSignal::new(false);

    let selected = RwSignal::new(None::<BookSummary>);
    let details = RwSignal::new(None::<BookDetails>);
    let details_busy = RwSignal::new(false);
    let subjects_expanded = RwSignal::new(false);

    search(state.clone(), submitted.get_untracked(), 1, results, busy);

    let go_to_page = Callback::new({
        let state = state.clone();
        move |page: u32| search(state.clone(), submitted.get_untracked(), page, results, busy)
    });

    let on_search = {
        let state = state.clone();
        move |ev: SubmitEvent| {
            ev.prevent_default();
            let value = term.get_untracked();
            submitted.set(value.clone());
            search(state.clone(), value, 1, results, busy);
        }
    };

    let on_select = Callback::new(move |book: BookSummary| {
        details.set(None);
        subjects_expanded.set(false);
        let key = book.id.clone();
        selected.set(Some(book));
        if !is_works_key(&key) {
            return;
        }

        details_busy.set(true);
        spawn_local(async move {
            match api::work_details(&key).await {
                Ok(found) => {
                    if selected.with_untracked(|s| s.as_ref().is_some_and(|b| b.id == key)) {
                        details.set(Some(found));
                    }
                }
                Err(err) => log_warning(&format!("failed to load book details for {key}: {err}")),
            }
            details_busy.set(false);
        });
    });

    let on_discuss = Callback::new({
        let state = state.clone();
        move |book: BookSummary| {
            if !state.is_authenticated() {
                state.navigate(View::Auth);
                state.notice.set(Some("Please sign in to create posts".to_string()));
                return;
            }
            state.pending_book.set(Some(book));
            state.navigate(View::CreatePost);
        }
    });

    let book_grid = move || {
        results.get().map(|page| {
            let label = page_label(&page);
            let has_prev = page.has_prev();
            let has_next = page.has_next();
            let current = page.page;
            view! {
                <p class="results-count">{format!("{} books found", page.total)}</p>
                <div class="book-grid">
                    {page
                        .books
                        .into_iter()
                        .map(|book| {
                            let picked = book.clone();
                            view! {
                                <div class="book-card" on:click=move |_| on_select.run(picked.clone())>
                                    {match book.cover_url.clone() {
                                        Some(url) => view! { <img src=url alt=book.title.clone() /> }.into_any(),
                                        None => view! { <div class="no-cover">"No cover"</div> }.into_any(),
                                    }}
                                    <h4>{book.title.clone()}</h4>
                                    <p>{book.primary_author().to_string()}</p>
                                    {book.first_publish_year.map(|year| view! { <small>{year}</small> })}
                                </div>
                            }
                        })
                        .collect_view()}
                </div>
                <div class="pagination">
                    <button disabled=!has_prev on:click=move |_| go_to_page.run(current.saturating_sub(1).max(1))>
                        "Previous"
                    </button>
                    <span>{label}</span>
                    <button disabled=!has_next on:click=move |_| go_to_page.run(current + 1)>
                        "Next"
                    </button>
                </div>
            }
        })
    };

    let book_detail = move || {
        selected.get().map(|book| {
            let link = open_library_url(OPEN_LIBRARY_URL, &book.id);
            let discuss = book.clone();
            view! {
                <aside class="book-detail">
                    <button class="close" on:click=move |_| selected.set(None)>"×"</button>
                    {book.cover_url.clone().map(|url| view! { <img src=url alt="" /> })}
                    <h3>{book.title.clone()}</h3>
                    <p class="authors">{book.author_line()}</p>
                    {book.first_publish_year.map(|year| view! { <p>"First published: " {year}</p> })}
                    {book.language.clone().map(|lang| view! { <p>"Language: " {lang}</p> })}

                    <Show when=move || details_busy.get()>
                        <p class="loading">"Loading details..."</p>
                    </Show>
                    {move || details.get().map(|info| {
                        let expanded = subjects_expanded.get();
                        let toggle = subjects_toggle_label(&info, expanded);
                        view! {
                            <p class="description">
                                {info.description.clone().unwrap_or_else(|| "No description available.".to_string())}
                            </p>
                            <div class="subjects">
                                {info
                                    .visible_subjects(expanded)
                                    .iter()
                                    .map(|subject| view! { <span class="subject">{subject.clone()}</span> })
                                    .collect_view()}
                                {toggle.map(|label| view! {
                                    <button class="link" on:click=move |_| subjects_expanded.update(|e| *e = !*e)>
                                        {label}
                                    </button>
                                })}
                            </div>
                        }
                    })}

                    <a href=link target="_blank" rel="noopener noreferrer">"View on Open Library"</a>
                    <button on:click=move |_| on_discuss.run(discuss.clone())>"Start a Discussion"</button>
                </aside>
            }
        })
    };

    view! {
        <h2>"Explore Books"</h2>
        <form class="search-form" on:submit=on_search>
            <input
                type="search"
                placeholder="Search by title, author, or subject..."
                prop:value=move || term.get()
                on:input=move |ev| term.set(event_target_value(&ev))
            />
            <button type="submit" disabled=move || busy.get()>"Search"</button>
        </form>

        <Show when=move || busy.get()>
            <p class="loading">"Searching..."</p>
        </Show>
        {book_grid}
        {book_detail}
    }
}
