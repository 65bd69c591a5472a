use async_trait::async_trait;
use bookhub_core::comment::{Comment, NewCommentRow};
use bookhub_core::listing::PostQuery;
use bookhub_core::post::{NewPostRow, Post, PostChanges, UpvoteChange};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::{BookhubClientError, BookhubClientResult};
use crate::http_client::{HttpClient, endpoint};
use crate::store::{CommentStore, PostStore};

const POSTS: &str = "posts";
const COMMENTS: &str = "comments";

#[derive(Debug, Clone)]
/// REST-клиент таблиц `posts` и `comments` (`/rest/v1`).
pub(crate) struct RestClient {
    http: HttpClient,
    base_url: String,
    anon_key: String,
}

impl RestClient {
    pub(crate) fn new(http: HttpClient, base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            anon_key: anon_key.into(),
        }
    }

    /// Запрос к таблице. Без токена пользователя запрос идёт от имени anon-ключа.
    fn request(&self, method: Method, table: &str, token: Option<&str>) -> RequestBuilder {
        let url = endpoint(&self.base_url, &format!("/rest/v1/{table}"));
        self.http
            .request(method, &url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token.unwrap_or(&self.anon_key))
    }

    async fn select<T>(&self, table: &str, params: &[(&str, String)]) -> BookhubClientResult<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let request = self
            .request(Method::GET, table, None)
            .query(&[("select", "*")])
            .query(params);
        self.http.send(request).await
    }

    async fn insert<B, T>(&self, table: &str, token: &str, body: &B) -> BookhubClientResult<T>
    where
        B: Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let request = self
            .request(Method::POST, table, Some(token))
            .header("Prefer", "return=representation")
            .json(body);
        let rows: Vec<T> = self.http.send(request).await?;
        rows.into_iter().next().ok_or_else(|| {
            BookhubClientError::InvalidRequest(format!("insert into {table} returned no rows"))
        })
    }

    async fn update<B, T>(&self, table: &str, token: &str, id: Uuid, body: &B) -> BookhubClientResult<Option<T>>
    where
        B: Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let request = self
            .request(Method::PATCH, table, Some(token))
            .query(&[("id", eq(id))])
            .header("Prefer", "return=representation")
            .json(body);
        let rows: Vec<T> = self.http.send(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_where(&self, table: &str, token: &str, column: &str, id: Uuid) -> BookhubClientResult<()> {
        debug!(table, column, %id, "delete rows");
        let request = self
            .request(Method::DELETE, table, Some(token))
            .query(&[(column, eq(id))]);
        self.http.send_empty(request).await
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

#[async_trait]
impl PostStore for RestClient {
    async fn list_posts(&self, query: &PostQuery) -> BookhubClientResult<Vec<Post>> {
        let mut params = vec![("order", query.order_param())];
        if let Some(filter) = query.title_filter() {
            params.push(("title", filter));
        }
        debug!(order = %params[0].1, "list posts");
        self.select(POSTS, &params).await
    }

    async fn posts_by_user(&self, user_id: &str) -> BookhubClientResult<Vec<Post>> {
        let params = [
            ("user_id", eq(user_id)),
            ("order", "created_at.desc".to_string()),
        ];
        self.select(POSTS, &params).await
    }

    async fn get_post(&self, id: Uuid) -> BookhubClientResult<Option<Post>> {
        let rows: Vec<Post> = self.select(POSTS, &[("id", eq(id))]).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_post(&self, token: &str, row: NewPostRow) -> BookhubClientResult<Post> {
        self.insert(POSTS, token, &row).await
    }

    async fn update_post(
        &self,
        token: &str,
        id: Uuid,
        changes: PostChanges,
    ) -> BookhubClientResult<Option<Post>> {
        self.update(POSTS, token, id, &changes).await
    }

    async fn set_upvotes(
        &self,
        token: &str,
        id: Uuid,
        change: UpvoteChange,
    ) -> BookhubClientResult<Option<Post>> {
        self.update(POSTS, token, id, &change).await
    }

    async fn delete_post(&self, token: &str, id: Uuid) -> BookhubClientResult<()> {
        self.delete_where(POSTS, token, "id", id).await
    }
}

#[async_trait]
impl CommentStore for RestClient {
    async fn list_comments(&self, post_id: Uuid) -> BookhubClientResult<Vec<Comment>> {
        let params = [
            ("post_id", eq(post_id)),
            ("order", "created_at.desc".to_string()),
        ];
        self.select(COMMENTS, &params).await
    }

    async fn get_comment(&self, id: Uuid) -> BookhubClientResult<Option<Comment>> {
        let rows: Vec<Comment> = self.select(COMMENTS, &[("id", eq(id))]).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_comment(&self, token: &str, row: NewCommentRow) -> BookhubClientResult<Comment> {
        self.insert(COMMENTS, token, &row).await
    }

    async fn delete_comment(&self, token: &str, id: Uuid) -> BookhubClientResult<()> {
        self.delete_where(COMMENTS, token, "id", id).await
    }

    async fn delete_comments_for_post(&self, token: &str, post_id: Uuid) -> BookhubClientResult<()> {
        self.delete_where(COMMENTS, token, "post_id", post_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eq_filter_formats_value() {
        assert_eq!(eq(Uuid::nil()), "eq.00000000-0000-0000-0000-000000000000");
        assert_eq!(eq("user-1"), "eq.user-1");
    }
}
