//! Подписи и тексты экранов, не зависящие от DOM.

use bookhub_core::{BookDetails, Post, PostQuery, SearchPage, SortKey};

pub(crate) fn author_label(post: &Post) -> String {
    format!("by {}", post.post_author.as_deref().unwrap_or("Anonymous"))
}

/// Начало текста поста для карточки в ленте.
pub(crate) fn excerpt(content: &str, limit: usize) -> String {
    let content = content.trim();
    if content.chars().count() <= limit {
        return content.to_string();
    }
    let cut: String = content.chars().take(limit).collect();
    format!("{}...", cut.trim_end())
}

/// Подпись кнопки сортировки; у активной кнопки стрелка направления.
pub(crate) fn sort_label(query: &PostQuery, key: SortKey) -> String {
    if query.sort != key {
        return key.label().to_string();
    }
    let arrow = if query.ascending { "↑" } else { "↓" };
    format!("{} {arrow}", key.label())
}

pub(crate) fn empty_message(query: &PostQuery) -> &'static str {
    if query.search.trim().is_empty() {
        "No posts yet. Be the first to start a discussion!"
    } else {
        "No posts match your search."
    }
}

pub(crate) fn page_label(page: &SearchPage) -> String {
    format!("Page {} of {}", page.page, page.total_pages())
}

pub(crate) fn subjects_toggle_label(details: &BookDetails, expanded: bool) -> Option<String> {
    if details.can_collapse(expanded) {
        return Some("Show less".to_string());
    }
    match details.hidden_subjects(expanded) {
        0 => None,
        hidden => Some(format!("+{hidden} more")),
    }
}
