//! Параметры ленты постов: ключ сортировки, направление и поиск по заголовку.

use serde::{Deserialize, Serialize};

use crate::post::Post;

/// Ключ сортировки ленты.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    /// По дате создания.
    #[default]
    CreatedAt,
    /// По числу голосов.
    Upvotes,
}

impl SortKey {
    /// Имя колонки в бэкенде.
    pub fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Upvotes => "upvotes",
        }
    }

    /// Подпись для UI.
    pub fn label(self) -> &'static str {
        match self {
            Self::CreatedAt => "Date",
            Self::Upvotes => "Upvotes",
        }
    }
}

/// Запрос ленты. По умолчанию: сначала новые, без поиска.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostQuery {
    /// Ключ сортировки.
    pub sort: SortKey,
    /// По возрастанию.
    pub ascending: bool,
    /// Подстрока заголовка.
    pub search: String,
}

impl PostQuery {
    /// Повторное нажатие на тот же ключ меняет направление, другой ключ
    /// включается по убыванию.
    pub fn toggle_sort(&mut self, key: SortKey) {
        if self.sort == key {
            self.ascending = !self.ascending;
        } else {
            self.sort = key;
            self.ascending = false;
        }
    }

    /// Значение параметра `order`, например `created_at.desc`.
    pub fn order_param(&self) -> String {
        let direction = if self.ascending { "asc" } else { "desc" };
        format!("{}.{direction}", self.sort.column())
    }

    /// Значение фильтра по `title`, если задан поиск.
    pub fn title_filter(&self) -> Option<String> {
        let term = self.search.trim();
        if term.is_empty() {
            return None;
        }
        Some(format!("ilike.*{term}*"))
    }

    /// Подходит ли пост под поиск (без учёта регистра).
    pub fn matches(&self, post: &Post) -> bool {
        let term = self.search.trim();
        term.is_empty() || post.title.to_lowercase().contains(&term.to_lowercase())
    }

    /// Применяет фильтр и сортировку к локальному списку.
    pub fn apply(&self, posts: &mut Vec<Post>) {
        posts.retain(|post| self.matches(post));
        match self.sort {
            SortKey::CreatedAt => posts.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortKey::Upvotes => posts.sort_by_key(Post::upvote_count),
        }
        if !self.ascending {
            posts.reverse();
        }
    }
}
