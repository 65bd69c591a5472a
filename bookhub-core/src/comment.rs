use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Строка таблицы `comments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Идентификатор комментария.
    pub id: Uuid,
    /// Дата и время создания (UTC).
    pub created_at: DateTime<Utc>,
    /// Пост, к которому относится комментарий.
    pub post_id: Uuid,
    /// Текст.
    pub content: String,
    /// Автор.
    pub user_id: Option<String>,
}

impl Comment {
    /// Принадлежит ли комментарий пользователю.
    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }
}

/// Форма нового комментария.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    /// Пост.
    pub post_id: Uuid,
    /// Текст.
    pub content: String,
}

impl CommentDraft {
    /// Проверяет форму: пустой комментарий не отправляется.
    pub fn validate(self) -> Result<Self, DomainError> {
        let content = self.content.trim();
        if content.is_empty() {
            return Err(DomainError::Validation {
                field: "content",
                message: "Comment cannot be empty",
            });
        }
        Ok(Self {
            post_id: self.post_id,
            content: content.to_string(),
        })
    }

    /// Тело `INSERT` для бэкенда.
    pub fn into_insert(self, user_id: &str) -> NewCommentRow {
        NewCommentRow {
            post_id: self.post_id,
            content: self.content,
            user_id: user_id.to_string(),
        }
    }
}

/// Тело вставки в `comments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCommentRow {
    /// Пост.
    pub post_id: Uuid,
    /// Текст.
    pub content: String,
    /// Автор.
    pub user_id: String,
}

/// Сортирует комментарии от новых к старым.
pub fn sort_newest_first(comments: &mut [Comment]) {
    comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
