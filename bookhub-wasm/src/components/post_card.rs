use bookhub_core::Post;
use bookhub_core::date::format_relative;
use chrono::Local;
use leptos::prelude::*;
use uuid::Uuid;

use crate::display::{author_label, excerpt};

#[component]
pub(crate) fn PostCard(post: Post, on_open: Callback<Uuid>) -> impl IntoView {
    let id = post.id;
    let created = format_relative(
        Some(&post.created_at.with_timezone(&Local)),
        &Local::now(),
    );
    let book_line = post.book().map(|book| match book.author {
        Some(author) => format!("{} by {author}", book.title),
        None => book.title,
    });

    view! {
        <article class="post-card" on:click=move |_| on_open.run(id)>
            {post.image_url.clone().map(|url| view! { <img class="post-thumb" src=url alt="" /> })}
            <div class="post-card-body">
                <h3>{post.title.clone()}</h3>
                <p class="post-meta">{author_label(&post)} " · " {created}</p>
                {book_line.map(|line| view! { <p class="book-badge">"📚 " {line}</p> })}
                <p class="post-excerpt">{excerpt(post.content_text(), 160)}</p>
                <span class="upvotes">"▲ " {post.upvote_count()}</span>
            </div>
        </article>
    }
}
