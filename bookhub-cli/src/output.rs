use bookhub_client::{BookDetails, Comment, Post, PostDetail, SearchPage, SessionUser};
use bookhub_core::book::open_library_url;
use bookhub_core::date::{format_relative, format_short};
use chrono::{DateTime, Local, Utc};

const NO_COMMENTS: &str = "Комментариев пока нет.";

fn author_name(post: &Post) -> &str {
    post.post_author
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or("аноним")
}

fn book_line(post: &Post) -> Option<String> {
    let book = post.book()?;
    Some(match &book.author {
        Some(author) => format!("{} / {author} ({})", book.title, book.api_id),
        None => format!("{} ({})", book.title, book.api_id),
    })
}

fn relative(date: &DateTime<Utc>) -> String {
    format_relative(Some(&date.with_timezone(&Local)), &Local::now())
}

pub fn print_user(title: &str, user: &SessionUser) {
    println!("{title}");
    println!("  id: {}", user.id);
    println!("  name: {}", user.display_name());
    if let Some(email) = &user.email {
        println!("  email: {email}");
    }
}

pub fn print_post(title: &str, post: &Post) {
    println!("{title}");
    println!("id: {}", post.id);
    println!("title: {}", post.title);
    println!("author: {}", author_name(post));
    println!("created: {}", relative(&post.created_at));
    println!("upvotes: {}", post.upvote_count());
    if let Some(book) = book_line(post) {
        println!("book: {book}");
    }
    if let Some(image_url) = &post.image_url {
        println!("image: {image_url}");
    }
    let content = post.content_text();
    if !content.is_empty() {
        println!();
        println!("{content}");
    }
}

pub fn print_posts(title: &str, posts: &[Post]) {
    println!("{title}: {}", posts.len());
    for post in posts {
        println!(
            "- [{}] {} (upvotes={}, {})",
            post.id,
            post.title,
            post.upvote_count(),
            relative(&post.created_at)
        );
    }
}

fn print_comments(comments: &[Comment]) {
    println!("Комментарии ({}):", comments.len());
    if comments.is_empty() {
        println!("  {NO_COMMENTS}");
    }
    for comment in comments {
        println!(
            "- [{}] {}: {}",
            comment.id,
            format_short(&comment.created_at.with_timezone(&Local)),
            comment.content
        );
    }
}

pub fn print_book(details: &BookDetails, catalog_url: &str) {
    println!("Книга");
    if let Some(title) = &details.title {
        println!("title: {title}");
    }
    if let Some(date) = &details.first_publish_date {
        println!("first published: {date}");
    }
    if let Some(description) = &details.description {
        println!("description: {description}");
    }
    if !details.subjects.is_empty() {
        println!("subjects: {}", details.subjects.join(", "));
    }
    if let Some(key) = &details.key {
        println!("link: {}", open_library_url(catalog_url, key));
    }
}

pub fn print_detail(detail: &PostDetail, catalog_url: &str) {
    print_post("Пост", &detail.post);
    println!();
    if let Some(book) = &detail.book {
        print_book(book, catalog_url);
        println!();
    }
    print_comments(&detail.comments);
}

pub fn print_search(page: &SearchPage) {
    println!(
        "Найдено: {} (страница {} из {})",
        page.total,
        page.page,
        page.total_pages()
    );
    for book in &page.books {
        let year = book
            .first_publish_year
            .map(|year| format!(", {year}"))
            .unwrap_or_default();
        println!("- [{}] {} ({}{year})", book.id, book.title, book.author_line());
    }
}
