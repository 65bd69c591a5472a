use bookhub_core::book::{OPEN_LIBRARY_URL, is_works_key, open_library_url};
use bookhub_core::comment::sort_newest_first;
use bookhub_core::date::{format_relative, format_short};
use bookhub_core::post::UpvoteChange;
use bookhub_core::{BookDetails, BookRef, BookSummary, Comment, CommentDraft, Post, PostPatch};
use chrono::Local;
use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;
use uuid::Uuid;

use crate::api;
use crate::components::create_post::BookPicker;
use crate::components::{confirm, log_warning};
use crate::state::{AppState, View};

/// Подробности книги грузятся только для ключей `/works/`; ошибка не мешает
/// показу поста.
async fn load_book(book_api_id: Option<String>, book: RwSignal<Option<BookDetails>>) {
    book.set(None);
    let Some(key) = book_api_id.filter(|key| is_works_key(key)) else {
        return;
    };
    match api::work_details(&key).await {
        Ok(details) => book.set(Some(details)),
        Err(err) => log_warning(&format!("failed to load book details: {err}")),
    }
}

fn load(
    state: AppState,
    post_id: Uuid,
    post: RwSignal<Option<Post>>,
    comments: RwSignal<Vec<Comment>>,
    book: RwSignal<Option<BookDetails>>,
) {
    state.loading.set(true);
    spawn_local(async move {
        match api::get_post(post_id).await {
            Ok(found) => {
                let key = found.book_api_id.clone();
                post.set(Some(found));
                load_book(key, book).await;
            }
            Err(err) => {
                state.set_error(err.to_string());
                state.loading.set(false);
                return;
            }
        }

        match api::list_comments(post_id).await {
            Ok(mut list) => {
                sort_newest_first(&mut list);
                comments.set(list);
            }
            Err(err) => state.set_error(err.to_string()),
        }
        state.loading.set(false);
    });
}

/// Поля формы редактирования; у каждого поля свой сигнал, чтобы ввод не
/// перерисовывал всю форму.
#[derive(Clone, Copy)]
struct EditForm {
    open: RwSignal<bool>,
    title: RwSignal<String>,
    content: RwSignal<String>,
    image_url: RwSignal<String>,
    book: RwSignal<Option<BookRef>>,
}

impl EditForm {
    fn new() -> Self {
        Self {
            open: RwSignal::new(false),
            title: RwSignal::new(String::new()),
            content: RwSignal::new(String::new()),
            image_url: RwSignal::new(String::new()),
            book: RwSignal::new(None),
        }
    }

    fn start(&self, post: &Post) {
        let patch = PostPatch::from(post);
        self.title.set(patch.title);
        self.content.set(patch.content);
        self.image_url.set(patch.image_url.unwrap_or_default());
        self.book.set(patch.book);
        self.open.set(true);
    }

    fn patch(&self) -> PostPatch {
        PostPatch {
            title: self.title.get_untracked(),
            content: self.content.get_untracked(),
            image_url: Some(self.image_url.get_untracked()),
            book: self.book.get_untracked(),
        }
    }

    fn pick_book(&self, picked: &BookSummary) {
        let mut patch = self.patch();
        patch.attach_book(picked);
        self.book.set(patch.book);
        self.image_url.set(patch.image_url.unwrap_or_default());
    }
}

#[component]
fn CommentCard(
    comment: Comment,
    can_delete: bool,
    on_delete: Callback<Uuid>,
) -> impl IntoView {
    let id = comment.id;
    view! {
        <div class="comment-card">
            <p>{comment.content.clone()}</p>
            <small>{format_short(&comment.created_at.with_timezone(&Local))}</small>
            {can_delete.then(|| view! {
                <button class="link danger" on:click=move |_| on_delete.run(id)>"Delete"</button>
            })}
        </div>
    }
}

#[component]
pub(crate) fn PostDetail(state: AppState, post_id: Uuid) -> impl IntoView {
    let post = RwSignal::new(None::<Post>);
    let comments = RwSignal::new(Vec::<Comment>::new());
    let book = RwSignal::new(None::<BookDetails>);
    let form = EditForm::new();
    let comment_text = RwSignal::new(String::new());
    let upvoting = RwSignal::new(false);
    let commenting = RwSignal::new(false);

    load(state.clone(), post_id, post, comments, book);

    let on_upvote = Callback::new({
        let state = state.clone();
        move |_: ()| {
            if upvoting.get_untracked() {
                return;
            }
            if !state.is_authenticated() {
                state.set_error("Please sign in to upvote posts");
                return;
            }
            upvoting.set(true);
            let state = state.clone();
            spawn_local(async move {
                let session = state.fresh_session().await;
                if let (Some(session), Some(current)) = (session, post.get_untracked()) {
                    let change = UpvoteChange::next_for(&current);
                    match api::set_upvotes(&session.access_token, post_id, change).await {
                        Ok(updated) => post.set(Some(updated)),
                        Err(err) => state.set_error(err.to_string()),
                    }
                }
                upvoting.set(false);
            });
        }
    });

    let on_delete_post = Callback::new({
        let state = state.clone();
        move |_: ()| {
            if !state.is_authenticated() || !confirm("Are you sure you want to delete this post?") {
                return;
            }
            state.loading.set(true);
            let state = state.clone();
            spawn_local(async move {
                if let Some(session) = state.fresh_session().await {
                    match api::delete_post(&session.access_token, post_id).await {
                        Ok(()) => state.navigate(View::Home),
                        Err(err) => state.set_error(err.to_string()),
                    }
                }
                state.loading.set(false);
            });
        }
    });

    let on_save_edit = Callback::new({
        let state = state.clone();
        move |_: ()| {
            let changes = match form.patch().validate() {
                Ok(patch) => patch.into_changes(),
                Err(err) => {
                    state.set_error(err.to_string());
                    return;
                }
            };
            state.loading.set(true);
            let state = state.clone();
            spawn_local(async move {
                if let Some(session) = state.fresh_session().await {
                    match api::update_post(&session.access_token, post_id, &changes).await {
                        Ok(updated) => {
                            let key = updated.book_api_id.clone();
                            post.set(Some(updated));
                            form.open.set(false);
                            state.clear_error();
                            load_book(key, book).await;
                        }
                        Err(err) => state.set_error(err.to_string()),
                    }
                }
                state.loading.set(false);
            });
        }
    });

    let on_add_comment = {
        let state = state.clone();
        move |ev: SubmitEvent| {
            ev.prevent_default();
            if commenting.get_untracked() {
                return;
            }
            if !state.is_authenticated() {
                state.set_error("Please sign in to comment");
                return;
            }
            let draft = CommentDraft {
                post_id,
                content: comment_text.get_untracked(),
            };
            let draft = match draft.validate() {
                Ok(draft) => draft,
                Err(err) => {
                    state.set_error(err.to_string());
                    return;
                }
            };
            commenting.set(true);
            let state = state.clone();
            spawn_local(async move {
                if let Some(session) = state.fresh_session().await {
                    let row = draft.into_insert(&session.user.id);
                    match api::add_comment(&session.access_token, &row).await {
                        Ok(created) => {
                            comments.update(|list| list.insert(0, created));
                            comment_text.set(String::new());
                            state.clear_error();
                        }
                        Err(err) => state.set_error(err.to_string()),
                    }
                }
                commenting.set(false);
            });
        }
    };

    let on_delete_comment = Callback::new({
        let state = state.clone();
        move |id: Uuid| {
            if !state.is_authenticated() || !confirm("Delete this comment?") {
                return;
            }
            let state = state.clone();
            spawn_local(async move {
                let Some(session) = state.fresh_session().await else {
                    return;
                };
                match api::delete_comment(&session.access_token, id).await {
                    Ok(()) => comments.update(|list| list.retain(|c| c.id != id)),
                    Err(err) => state.set_error(err.to_string()),
                }
            });
        }
    });

    let on_pick_book = Callback::new(move |picked: BookSummary| form.pick_book(&picked));

    let loading = state.loading;
    let session = state.session;

    let post_view = {
        let state = state.clone();
        move || {
            post.get().map(|current| {
                let is_author = state.is_author(current.user_id.as_deref());
                let created = format_relative(
                    Some(&current.created_at.with_timezone(&Local)),
                    &Local::now(),
                );
                let book_ref = current.book();
                let editable = current.clone();
                view! {
                    <article class="post-detail">
                        {current.image_url.clone().map(|url| view! { <img class="post-image" src=url alt="" /> })}
                        <h2>{current.title.clone()}</h2>
                        <p class="post-meta">
                            "by " {current.post_author.clone().unwrap_or_else(|| "Anonymous".to_string())}
                            " · " {created}
                        </p>
                        {book_ref.map(|book_ref| view! {
                            <div class="book-badge">
                                "📚 " <strong>{book_ref.title}</strong>
                                {book_ref.author.map(|author| view! { <span>" by " {author}</span> })}
                            </div>
                        })}
                        <p class="post-content">{current.content_text().to_string()}</p>

                        <div class="post-actions">
                            <button disabled=move || upvoting.get() on:click=move |_| on_upvote.run(())>
                                "▲ Upvote (" {current.upvote_count()} ")"
                            </button>
                            {is_author.then(|| view! {
                                <button on:click=move |_| form.start(&editable)>"Edit"</button>
                                <button class="danger" disabled=move || loading.get() on:click=move |_| on_delete_post.run(())>
                                    "Delete"
                                </button>
                            })}
                        </div>
                    </article>
                }
            })
        }
    };

    let edit_view = view! {
        <Show when=move || form.open.get()>
            <div class="edit-form">
                <h3>"Edit Post"</h3>
                <input
                    prop:value=move || form.title.get()
                    on:input=move |ev| form.title.set(event_target_value(&ev))
                />
                <textarea
                    rows="6"
                    prop:value=move || form.content.get()
                    on:input=move |ev| form.content.set(event_target_value(&ev))
                ></textarea>
                <input
                    placeholder="Image URL"
                    prop:value=move || form.image_url.get()
                    on:input=move |ev| form.image_url.set(event_target_value(&ev))
                />
                {move || match form.book.get() {
                    Some(selected) => view! {
                        <div class="selected-book">
                            <strong>{selected.title}</strong>
                            <button type="button" on:click=move |_| form.book.set(None)>
                                "Remove"
                            </button>
                        </div>
                    }
                    .into_any(),
                    None => view! { <BookPicker on_pick=on_pick_book /> }.into_any(),
                }}
                <button disabled=move || loading.get() on:click=move |_| on_save_edit.run(())>"Save"</button>
                <button on:click=move |_| form.open.set(false)>"Cancel"</button>
            </div>
        </Show>
    };

    let book_view = move || {
        book.get().map(|details| {
            let link = details
                .key
                .as_deref()
                .map(|key| open_library_url(OPEN_LIBRARY_URL, key));
            view! {
                <section class="book-info">
                    <h3>"About the Book"</h3>
                    {details.first_publish_date.clone().map(|date| view! { <p>"First published: " {date}</p> })}
                    <p>{details.description.clone().unwrap_or_else(|| "No description available.".to_string())}</p>
                    <div class="subjects">
                        {details
                            .visible_subjects(false)
                            .iter()
                            .map(|subject| view! { <span class="subject">{subject.clone()}</span> })
                            .collect_view()}
                    </div>
                    {link.map(|href| view! {
                        <a href=href target="_blank" rel="noopener noreferrer">"View on Open Library"</a>
                    })}
                </section>
            }
        })
    };

    let state_for_comments = state.clone();

    view! {
        <button class="link" on:click={
            let state = state.clone();
            move |_| state.navigate(View::Home)
        }>"← Back to posts"</button>

        <Show when=move || loading.get() && post.with(Option::is_none)>
            <p class="loading">"Loading post..."</p>
        </Show>
        {post_view}
        {edit_view}
        {book_view}

        <section class="comments">
            <h3>{move || format!("Comments ({})", comments.with(Vec::len))}</h3>
            <Show
                when=move || session.with(Option::is_some)
                fallback=|| view! { <p>"Sign in to join the discussion."</p> }
            >
                <form class="comment-form" on:submit=on_add_comment.clone()>
                    <textarea
                        rows="3"
                        placeholder="Add a comment..."
                        prop:value=move || comment_text.get()
                        on:input=move |ev| comment_text.set(event_target_value(&ev))
                    ></textarea>
                    <button type="submit" disabled=move || commenting.get()>
                        {move || if commenting.get() { "Posting..." } else { "Post Comment" }}
                    </button>
                </form>
            </Show>
            <Show when=move || comments.with(Vec::is_empty)>
                <p class="empty">"No comments yet. Be the first to share your thoughts!"</p>
            </Show>
            <For
                each=move || comments.get()
                key=|comment| comment.id
                children=move |comment| {
                    let can_delete = state_for_comments.is_author(comment.user_id.as_deref());
                    view! {
                        <CommentCard comment=comment can_delete=can_delete on_delete=on_delete_comment />
                    }
                }
            />
        </section>
    }
}
