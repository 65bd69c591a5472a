use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::book::{BookRef, BookSummary};
use crate::error::DomainError;

/// Строка таблицы `posts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Идентификатор поста.
    pub id: Uuid,
    /// Дата и время создания (UTC).
    pub created_at: DateTime<Utc>,
    /// Заголовок.
    pub title: String,
    /// Текст поста.
    pub content: Option<String>,
    /// URL картинки.
    pub image_url: Option<String>,
    /// Ключ книги в каталоге.
    pub book_api_id: Option<String>,
    /// Название книги.
    pub book_title: Option<String>,
    /// Авторы книги.
    pub book_author: Option<String>,
    /// Счётчик голосов; `null` в базе читается как 0.
    pub upvotes: Option<i64>,
    /// Идентификатор автора поста.
    pub user_id: Option<String>,
    /// Отображаемое имя автора на момент публикации.
    pub post_author: Option<String>,
}

impl Post {
    /// Число голосов.
    pub fn upvote_count(&self) -> i64 {
        self.upvotes.unwrap_or(0)
    }

    /// Текст поста или пустая строка.
    pub fn content_text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    /// Принадлежит ли пост пользователю.
    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }

    /// Привязанная книга, если у поста есть её название.
    pub fn book(&self) -> Option<BookRef> {
        let title = self.book_title.as_deref().filter(|t| !t.trim().is_empty())?;
        Some(BookRef {
            api_id: self.book_api_id.clone().unwrap_or_default(),
            title: title.to_string(),
            author: self.book_author.clone().filter(|a| !a.trim().is_empty()),
        })
    }
}

/// Форма создания поста.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDraft {
    /// Заголовок (обязателен).
    pub title: String,
    /// Текст.
    pub content: String,
    /// URL картинки.
    pub image_url: Option<String>,
    /// Книга, о которой пост.
    pub book: Option<BookRef>,
    /// Отображаемое имя автора; по умолчанию берётся из сессии.
    pub post_author: Option<String>,
}

impl PostDraft {
    /// Привязывает книгу; обложка книги заменяет картинку поста.
    pub fn attach_book(&mut self, book: &BookSummary) {
        self.book = Some(BookRef::from(book));
        if let Some(cover) = &book.cover_url {
            self.image_url = Some(cover.clone());
        }
    }

    /// Отвязывает книгу, картинка остаётся.
    pub fn detach_book(&mut self) {
        self.book = None;
    }

    /// Проверяет и нормализует форму.
    pub fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            title: normalize_title(&self.title)?,
            content: self.content.trim().to_string(),
            image_url: normalize_optional(self.image_url),
            book: self.book,
            post_author: normalize_optional(self.post_author),
        })
    }

    /// Тело `INSERT` для бэкенда. Новый пост всегда начинает с нуля голосов.
    pub fn into_insert(self, user_id: &str, default_author: &str) -> NewPostRow {
        let (book_api_id, book_title, book_author) = split_book(self.book);
        NewPostRow {
            title: self.title,
            content: self.content,
            image_url: self.image_url,
            book_api_id,
            book_title,
            book_author,
            upvotes: 0,
            user_id: user_id.to_string(),
            post_author: self
                .post_author
                .unwrap_or_else(|| default_author.to_string()),
        }
    }
}

/// Форма редактирования поста.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPatch {
    /// Заголовок (обязателен).
    pub title: String,
    /// Текст.
    pub content: String,
    /// URL картинки.
    pub image_url: Option<String>,
    /// Книга; `None` отвязывает книгу.
    pub book: Option<BookRef>,
}

impl From<&Post> for PostPatch {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            content: post.content_text().to_string(),
            image_url: post.image_url.clone(),
            book: post.book(),
        }
    }
}

impl PostPatch {
    /// Привязывает книгу; обложка книги заменяет картинку поста.
    pub fn attach_book(&mut self, book: &BookSummary) {
        self.book = Some(BookRef::from(book));
        if let Some(cover) = &book.cover_url {
            self.image_url = Some(cover.clone());
        }
    }

    /// Проверяет и нормализует форму.
    pub fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            title: normalize_title(&self.title)?,
            content: self.content.trim().to_string(),
            image_url: normalize_optional(self.image_url),
            book: self.book,
        })
    }

    /// Тело `PATCH` для бэкенда.
    pub fn into_changes(self) -> PostChanges {
        let (book_api_id, book_title, book_author) = split_book(self.book);
        PostChanges {
            title: self.title,
            content: self.content,
            image_url: self.image_url,
            book_api_id,
            book_title,
            book_author,
        }
    }
}

/// Тело вставки в `posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPostRow {
    /// Заголовок.
    pub title: String,
    /// Текст.
    pub content: String,
    /// URL картинки.
    pub image_url: Option<String>,
    /// Ключ книги.
    pub book_api_id: Option<String>,
    /// Название книги.
    pub book_title: Option<String>,
    /// Авторы книги.
    pub book_author: Option<String>,
    /// Начальный счётчик голосов.
    pub upvotes: i64,
    /// Автор поста.
    pub user_id: String,
    /// Отображаемое имя автора.
    pub post_author: String,
}

/// Тело обновления в `posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostChanges {
    /// Заголовок.
    pub title: String,
    /// Текст.
    pub content: String,
    /// URL картинки.
    pub image_url: Option<String>,
    /// Ключ книги.
    pub book_api_id: Option<String>,
    /// Название книги.
    pub book_title: Option<String>,
    /// Авторы книги.
    pub book_author: Option<String>,
}

/// Тело обновления счётчика голосов.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpvoteChange {
    /// Новое значение счётчика.
    pub upvotes: i64,
}

impl UpvoteChange {
    /// Следующее значение счётчика для поста.
    pub fn next_for(post: &Post) -> Self {
        Self {
            upvotes: post.upvote_count().saturating_add(1),
        }
    }
}

fn split_book(book: Option<BookRef>) -> (Option<String>, Option<String>, Option<String>) {
    match book {
        Some(book) => (Some(book.api_id), Some(book.title), book.author),
        None => (None, None, None),
    }
}

fn normalize_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::Validation {
            field: "title",
            message: "Post title is required",
        });
    }
    Ok(title.to_string())
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
