//! Точки расширения сервиса: хранилище записей и каталог книг.

use async_trait::async_trait;
use bookhub_core::book::{BookDetails, SearchPage};
use bookhub_core::comment::{Comment, NewCommentRow};
use bookhub_core::listing::PostQuery;
use bookhub_core::post::{NewPostRow, Post, PostChanges, UpvoteChange};
use uuid::Uuid;

use crate::error::BookhubClientResult;

/// Таблица постов.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Лента с сортировкой и поиском по заголовку.
    async fn list_posts(&self, query: &PostQuery) -> BookhubClientResult<Vec<Post>>;
    /// Посты одного автора.
    async fn posts_by_user(&self, user_id: &str) -> BookhubClientResult<Vec<Post>>;
    /// Пост по идентификатору.
    async fn get_post(&self, id: Uuid) -> BookhubClientResult<Option<Post>>;
    /// Вставка поста.
    async fn insert_post(&self, token: &str, row: NewPostRow) -> BookhubClientResult<Post>;
    /// Обновление полей поста; `None`, если строка не изменилась.
    async fn update_post(
        &self,
        token: &str,
        id: Uuid,
        changes: PostChanges,
    ) -> BookhubClientResult<Option<Post>>;
    /// Запись нового значения счётчика голосов.
    async fn set_upvotes(
        &self,
        token: &str,
        id: Uuid,
        change: UpvoteChange,
    ) -> BookhubClientResult<Option<Post>>;
    /// Удаление поста.
    async fn delete_post(&self, token: &str, id: Uuid) -> BookhubClientResult<()>;
}

/// Таблица комментариев.
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Комментарии поста, новые первыми.
    async fn list_comments(&self, post_id: Uuid) -> BookhubClientResult<Vec<Comment>>;
    /// Комментарий по идентификатору.
    async fn get_comment(&self, id: Uuid) -> BookhubClientResult<Option<Comment>>;
    /// Вставка комментария.
    async fn insert_comment(&self, token: &str, row: NewCommentRow) -> BookhubClientResult<Comment>;
    /// Удаление комментария.
    async fn delete_comment(&self, token: &str, id: Uuid) -> BookhubClientResult<()>;
    /// Удаление всех комментариев поста.
    async fn delete_comments_for_post(&self, token: &str, post_id: Uuid) -> BookhubClientResult<()>;
}

/// Каталог книг.
#[async_trait]
pub trait BookCatalog: Send + Sync {
    /// Поиск по ключевым словам, страницы нумеруются с 1.
    async fn search(&self, query: &str, page: u32, limit: u32) -> BookhubClientResult<SearchPage>;
    /// Подробности произведения по ключу.
    async fn work_details(&self, key: &str) -> BookhubClientResult<BookDetails>;
}
