use bookhub_core::auth::Session;
use bookhub_core::book::{BookDetails, SearchPage, is_works_key};
use bookhub_core::comment::{Comment, CommentDraft, sort_newest_first};
use bookhub_core::error::DomainError;
use bookhub_core::listing::PostQuery;
use bookhub_core::post::{Post, PostDraft, PostPatch, UpvoteChange};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{BookhubClientError, BookhubClientResult};
use crate::store::{BookCatalog, CommentStore, PostStore};

#[derive(Debug, Clone)]
/// Пост со всем, что показывается на его странице.
pub struct PostDetail {
    /// Пост.
    pub post: Post,
    /// Комментарии, новые первыми.
    pub comments: Vec<Comment>,
    /// Подробности привязанной книги, если их удалось получить.
    pub book: Option<BookDetails>,
}

/// Правила работы с постами, комментариями и каталогом поверх хранилищ.
pub(crate) struct BookhubService<S, C>
where
    S: PostStore + CommentStore,
    C: BookCatalog,
{
    store: S,
    catalog: C,
}

fn require_session<'a>(
    session: Option<&'a Session>,
    message: &'static str,
) -> Result<&'a Session, DomainError> {
    session.ok_or(DomainError::Unauthorized(message))
}

impl<S, C> BookhubService<S, C>
where
    S: PostStore + CommentStore,
    C: BookCatalog,
{
    pub(crate) fn new(store: S, catalog: C) -> Self {
        Self { store, catalog }
    }

    pub(crate) async fn list_posts(&self, query: &PostQuery) -> BookhubClientResult<Vec<Post>> {
        self.store.list_posts(query).await
    }

    pub(crate) async fn posts_by_user(&self, user_id: &str) -> BookhubClientResult<Vec<Post>> {
        self.store.posts_by_user(user_id).await
    }

    pub(crate) async fn get_post(&self, id: Uuid) -> BookhubClientResult<Post> {
        self.store
            .get_post(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("post id: {id}")).into())
    }

    /// Пост, его комментарии и подробности книги. Ошибка каталога не мешает
    /// показать пост.
    pub(crate) async fn post_detail(&self, id: Uuid) -> BookhubClientResult<PostDetail> {
        let post = self.get_post(id).await?;
        let mut comments = self.store.list_comments(id).await?;
        sort_newest_first(&mut comments);

        let book = match post.book_api_id.as_deref().filter(|key| is_works_key(key)) {
            Some(key) => match self.catalog.work_details(key).await {
                Ok(details) => Some(details),
                Err(err) => {
                    warn!(%key, error = %err, "failed to fetch book details");
                    None
                }
            },
            None => None,
        };

        Ok(PostDetail {
            post,
            comments,
            book,
        })
    }

    pub(crate) async fn create_post(
        &self,
        session: Option<&Session>,
        draft: PostDraft,
    ) -> BookhubClientResult<Post> {
        let session = require_session(session, "Please sign in to create posts")?;
        let draft = draft.validate()?;

        let row = draft.into_insert(&session.user.id, &session.user.display_name());
        let post = self.store.insert_post(&session.access_token, row).await?;
        info!(post_id = %post.id, "post created");
        Ok(post)
    }

    pub(crate) async fn update_post(
        &self,
        session: Option<&Session>,
        id: Uuid,
        patch: PostPatch,
    ) -> BookhubClientResult<Post> {
        let session = require_session(session, "Please sign in to edit posts")?;
        let original = self.get_post(id).await?;
        if !original.is_authored_by(&session.user.id) {
            return Err(DomainError::Forbidden("You don't have permission to edit this post").into());
        }
        let patch = patch.validate()?;

        self.store
            .update_post(&session.access_token, id, patch.into_changes())
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("post id: {id}")).into())
    }

    /// Удаляет пост автора вместе с его комментариями.
    pub(crate) async fn delete_post(&self, session: Option<&Session>, id: Uuid) -> BookhubClientResult<()> {
        let session = require_session(session, "Please sign in to delete posts")?;
        let original = self.get_post(id).await?;
        if !original.is_authored_by(&session.user.id) {
            return Err(
                DomainError::Forbidden("You don't have permission to delete this post").into(),
            );
        }

        self.store
            .delete_comments_for_post(&session.access_token, id)
            .await?;
        self.store.delete_post(&session.access_token, id).await?;
        info!(post_id = %id, "post deleted");
        Ok(())
    }

    /// Увеличивает счётчик голосов на единицу от текущего значения.
    pub(crate) async fn upvote(&self, session: Option<&Session>, id: Uuid) -> BookhubClientResult<Post> {
        let session = require_session(session, "Please sign in to upvote posts")?;
        let post = self.get_post(id).await?;

        self.store
            .set_upvotes(&session.access_token, id, UpvoteChange::next_for(&post))
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("post id: {id}")).into())
    }

    pub(crate) async fn add_comment(
        &self,
        session: Option<&Session>,
        draft: CommentDraft,
    ) -> BookhubClientResult<Comment> {
        let session = require_session(session, "Please sign in to comment")?;
        let draft = draft.validate()?;

        self.store
            .insert_comment(&session.access_token, draft.into_insert(&session.user.id))
            .await
    }

    pub(crate) async fn delete_comment(
        &self,
        session: Option<&Session>,
        id: Uuid,
    ) -> BookhubClientResult<()> {
        let session = require_session(session, "Please sign in to delete comments")?;
        let comment = self
            .store
            .get_comment(id)
            .await?
            .ok_or_else(|| BookhubClientError::from(DomainError::NotFound(format!("comment id: {id}"))))?;
        if !comment.is_authored_by(&session.user.id) {
            return Err(
                DomainError::Forbidden("You can only delete your own comments").into(),
            );
        }

        self.store.delete_comment(&session.access_token, id).await
    }

    pub(crate) async fn search_books(
        &self,
        query: &str,
        page: u32,
        limit: u32,
    ) -> BookhubClientResult<SearchPage> {
        self.catalog.search(query, page, limit).await
    }

    pub(crate) async fn book_details(&self, key: &str) -> BookhubClientResult<BookDetails> {
        self.catalog.work_details(key).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use bookhub_core::auth::{SessionUser, UserMetadata};
    use bookhub_core::comment::NewCommentRow;
    use bookhub_core::post::{NewPostRow, PostChanges};
    use chrono::{Duration, Utc};

    use super::*;

    #[derive(Clone, Default)]
    struct FakeStore {
        posts: Arc<Mutex<Vec<Post>>>,
        comments: Arc<Mutex<Vec<Comment>>>,
        inserted_post: Arc<Mutex<Option<NewPostRow>>>,
        upvote_call: Arc<Mutex<Option<(String, Uuid, UpvoteChange)>>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl FakeStore {
        fn with_post(post: Post) -> Self {
            let store = Self::default();
            store.posts.lock().expect("posts mutex poisoned").push(post);
            store
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().expect("calls mutex poisoned").push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("calls mutex poisoned").clone()
        }
    }

    #[async_trait]
    impl PostStore for FakeStore {
        async fn list_posts(&self, query: &PostQuery) -> BookhubClientResult<Vec<Post>> {
            let mut posts = self.posts.lock().expect("posts mutex poisoned").clone();
            query.apply(&mut posts);
            Ok(posts)
        }

        async fn posts_by_user(&self, user_id: &str) -> BookhubClientResult<Vec<Post>> {
            let posts = self.posts.lock().expect("posts mutex poisoned");
            Ok(posts
                .iter()
                .filter(|post| post.is_authored_by(user_id))
                .cloned()
                .collect())
        }

        async fn get_post(&self, id: Uuid) -> BookhubClientResult<Option<Post>> {
            let posts = self.posts.lock().expect("posts mutex poisoned");
            Ok(posts.iter().find(|post| post.id == id).cloned())
        }

        async fn insert_post(&self, _token: &str, row: NewPostRow) -> BookhubClientResult<Post> {
            self.record("insert_post");
            *self
                .inserted_post
                .lock()
                .expect("inserted_post mutex poisoned") = Some(row.clone());
            let mut post = sample_post(Uuid::new_v4(), &row.user_id);
            post.title = row.title;
            post.upvotes = Some(row.upvotes);
            Ok(post)
        }

        async fn update_post(
            &self,
            _token: &str,
            id: Uuid,
            changes: PostChanges,
        ) -> BookhubClientResult<Option<Post>> {
            self.record("update_post");
            let mut posts = self.posts.lock().expect("posts mutex poisoned");
            Ok(posts.iter_mut().find(|post| post.id == id).map(|post| {
                post.title = changes.title;
                post.content = Some(changes.content);
                post.book_api_id = changes.book_api_id;
                post.book_title = changes.book_title;
                post.book_author = changes.book_author;
                post.clone()
            }))
        }

        async fn set_upvotes(
            &self,
            token: &str,
            id: Uuid,
            change: UpvoteChange,
        ) -> BookhubClientResult<Option<Post>> {
            *self
                .upvote_call
                .lock()
                .expect("upvote_call mutex poisoned") = Some((token.to_string(), id, change));
            let mut posts = self.posts.lock().expect("posts mutex poisoned");
            Ok(posts.iter_mut().find(|post| post.id == id).map(|post| {
                post.upvotes = Some(change.upvotes);
                post.clone()
            }))
        }

        async fn delete_post(&self, _token: &str, id: Uuid) -> BookhubClientResult<()> {
            self.record(format!("delete_post:{id}"));
            self.posts
                .lock()
                .expect("posts mutex poisoned")
                .retain(|post| post.id != id);
            Ok(())
        }
    }

    #[async_trait]
    impl CommentStore for FakeStore {
        async fn list_comments(&self, post_id: Uuid) -> BookhubClientResult<Vec<Comment>> {
            let comments = self.comments.lock().expect("comments mutex poisoned");
            Ok(comments
                .iter()
                .filter(|comment| comment.post_id == post_id)
                .cloned()
                .collect())
        }

        async fn get_comment(&self, id: Uuid) -> BookhubClientResult<Option<Comment>> {
            let comments = self.comments.lock().expect("comments mutex poisoned");
            Ok(comments.iter().find(|comment| comment.id == id).cloned())
        }

        async fn insert_comment(&self, _token: &str, row: NewCommentRow) -> BookhubClientResult<Comment> {
            self.record("insert_comment");
            Ok(Comment {
                id: Uuid::new_v4(),
                created_at: Utc::now(),
                post_id: row.post_id,
                content: row.content,
                user_id: Some(row.user_id),
            })
        }

        async fn delete_comment(&self, _token: &str, id: Uuid) -> BookhubClientResult<()> {
            self.record(format!("delete_comment:{id}"));
            Ok(())
        }

        async fn delete_comments_for_post(&self, _token: &str, post_id: Uuid) -> BookhubClientResult<()> {
            self.record(format!("delete_comments_for_post:{post_id}"));
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct FakeCatalog {
        details: Arc<Mutex<Option<BookDetails>>>,
        requested_keys: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl BookCatalog for FakeCatalog {
        async fn search(&self, _query: &str, page: u32, limit: u32) -> BookhubClientResult<SearchPage> {
            Ok(SearchPage {
                books: Vec::new(),
                total: 0,
                page,
                limit,
            })
        }

        async fn work_details(&self, key: &str) -> BookhubClientResult<BookDetails> {
            self.requested_keys
                .lock()
                .expect("requested_keys mutex poisoned")
                .push(key.to_string());
            self.details
                .lock()
                .expect("details mutex poisoned")
                .clone()
                .ok_or(BookhubClientError::NotFound)
        }
    }

    fn session(user_id: &str) -> Session {
        Session {
            access_token: format!("token-{user_id}"),
            refresh_token: "refresh".to_string(),
            expires_at: None,
            user: SessionUser {
                id: user_id.to_string(),
                email: Some(format!("{user_id}@example.com")),
                user_metadata: UserMetadata::default(),
            },
        }
    }

    fn sample_post(id: Uuid, user_id: &str) -> Post {
        Post {
            id,
            created_at: Utc::now(),
            title: "Dune".to_string(),
            content: Some("spice".to_string()),
            image_url: None,
            book_api_id: None,
            book_title: None,
            book_author: None,
            upvotes: Some(3),
            user_id: Some(user_id.to_string()),
            post_author: None,
        }
    }

    fn service(store: FakeStore) -> BookhubService<FakeStore, FakeCatalog> {
        BookhubService::new(store, FakeCatalog::default())
    }

    #[tokio::test]
    async fn create_post_rejects_blank_title_without_store_call() {
        let store = FakeStore::default();
        let service = service(store.clone());

        let draft = PostDraft {
            title: "   ".to_string(),
            ..PostDraft::default()
        };
        let err = service
            .create_post(Some(&session("alice")), draft)
            .await
            .expect_err("blank title must be rejected");

        assert!(matches!(
            err,
            BookhubClientError::Domain(DomainError::Validation { field: "title", .. })
        ));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn create_post_requires_session() {
        let service = service(FakeStore::default());
        let draft = PostDraft {
            title: "Title".to_string(),
            ..PostDraft::default()
        };

        let err = service
            .create_post(None, draft)
            .await
            .expect_err("anonymous create must fail");
        assert!(matches!(
            err,
            BookhubClientError::Domain(DomainError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn create_post_sets_author_and_zero_upvotes() {
        let store = FakeStore::default();
        let service = service(store.clone());

        let draft = PostDraft {
            title: "  Dune  ".to_string(),
            content: "first read".to_string(),
            ..PostDraft::default()
        };
        let created = service
            .create_post(Some(&session("alice")), draft)
            .await
            .expect("create must succeed");
        assert_eq!(created.title, "Dune");

        let row = store
            .inserted_post
            .lock()
            .expect("inserted_post mutex poisoned")
            .clone()
            .expect("insert must be captured");
        assert_eq!(row.user_id, "alice");
        assert_eq!(row.post_author, "alice");
        assert_eq!(row.upvotes, 0);
    }

    #[tokio::test]
    async fn update_post_is_forbidden_for_non_author() {
        let id = Uuid::new_v4();
        let store = FakeStore::with_post(sample_post(id, "alice"));
        let service = service(store.clone());

        let patch = PostPatch {
            title: "hijacked".to_string(),
            ..PostPatch::default()
        };
        let err = service
            .update_post(Some(&session("mallory")), id, patch)
            .await
            .expect_err("non-author edit must fail");

        assert!(matches!(err, BookhubClientError::Domain(DomainError::Forbidden(_))));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn update_post_by_author_applies_patch() {
        let id = Uuid::new_v4();
        let store = FakeStore::with_post(sample_post(id, "alice"));
        let service = service(store);

        let patch = PostPatch {
            title: " Dune Messiah ".to_string(),
            content: "sequel".to_string(),
            ..PostPatch::default()
        };
        let updated = service
            .update_post(Some(&session("alice")), id, patch)
            .await
            .expect("author edit must succeed");

        assert_eq!(updated.title, "Dune Messiah");
        assert_eq!(updated.content_text(), "sequel");
    }

    #[tokio::test]
    async fn delete_post_removes_comments_first() {
        let id = Uuid::new_v4();
        let store = FakeStore::with_post(sample_post(id, "alice"));
        let service = service(store.clone());

        service
            .delete_post(Some(&session("alice")), id)
            .await
            .expect("delete must succeed");

        assert_eq!(
            store.calls(),
            vec![
                format!("delete_comments_for_post:{id}"),
                format!("delete_post:{id}"),
            ]
        );
    }

    #[tokio::test]
    async fn delete_post_returns_not_found_for_missing_post() {
        let service = service(FakeStore::default());
        let err = service
            .delete_post(Some(&session("alice")), Uuid::new_v4())
            .await
            .expect_err("missing post");
        assert!(matches!(err, BookhubClientError::Domain(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn upvote_writes_current_count_plus_one() {
        let id = Uuid::new_v4();
        let store = FakeStore::with_post(sample_post(id, "alice"));
        let service = service(store.clone());

        let updated = service
            .upvote(Some(&session("bob")), id)
            .await
            .expect("upvote must succeed");
        assert_eq!(updated.upvote_count(), 4);

        let (token, post_id, change) = store
            .upvote_call
            .lock()
            .expect("upvote_call mutex poisoned")
            .clone()
            .expect("upvote call must be captured");
        assert_eq!(token, "token-bob");
        assert_eq!(post_id, id);
        assert_eq!(change.upvotes, 4);
    }

    #[tokio::test]
    async fn upvote_requires_session() {
        let id = Uuid::new_v4();
        let service = service(FakeStore::with_post(sample_post(id, "alice")));

        let err = service.upvote(None, id).await.expect_err("anonymous upvote");
        assert_eq!(err.user_message(), "Please sign in to upvote posts");
    }

    #[tokio::test]
    async fn delete_comment_only_by_its_author() {
        let post_id = Uuid::new_v4();
        let comment_id = Uuid::new_v4();
        let store = FakeStore::default();
        store
            .comments
            .lock()
            .expect("comments mutex poisoned")
            .push(Comment {
                id: comment_id,
                created_at: Utc::now(),
                post_id,
                content: "great".to_string(),
                user_id: Some("bob".to_string()),
            });
        let service = service(store.clone());

        let err = service
            .delete_comment(Some(&session("alice")), comment_id)
            .await
            .expect_err("foreign comment");
        assert!(matches!(err, BookhubClientError::Domain(DomainError::Forbidden(_))));

        service
            .delete_comment(Some(&session("bob")), comment_id)
            .await
            .expect("own comment");
        assert_eq!(store.calls(), vec![format!("delete_comment:{comment_id}")]);
    }

    #[tokio::test]
    async fn add_comment_rejects_blank_content() {
        let store = FakeStore::default();
        let service = service(store.clone());

        let draft = CommentDraft {
            post_id: Uuid::new_v4(),
            content: "  ".to_string(),
        };
        let err = service
            .add_comment(Some(&session("alice")), draft)
            .await
            .expect_err("blank comment");
        assert!(matches!(err, BookhubClientError::Domain(DomainError::Validation { .. })));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn post_detail_sorts_comments_and_tolerates_catalog_failure() {
        let id = Uuid::new_v4();
        let mut post = sample_post(id, "alice");
        post.book_api_id = Some("/works/OL45883W".to_string());
        post.book_title = Some("Dune".to_string());
        let store = FakeStore::with_post(post);
        {
            let mut comments = store.comments.lock().expect("comments mutex poisoned");
            for (age, text) in [(30, "old"), (5, "new"), (15, "mid")] {
                comments.push(Comment {
                    id: Uuid::new_v4(),
                    created_at: Utc::now() - Duration::seconds(age),
                    post_id: id,
                    content: text.to_string(),
                    user_id: None,
                });
            }
        }
        let catalog = FakeCatalog::default();
        let service = BookhubService::new(store, catalog.clone());

        let detail = service.post_detail(id).await.expect("detail must load");
        let order: Vec<&str> = detail.comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(order, vec!["new", "mid", "old"]);
        assert!(detail.book.is_none());
        assert_eq!(
            *catalog
                .requested_keys
                .lock()
                .expect("requested_keys mutex poisoned"),
            vec!["/works/OL45883W".to_string()]
        );
    }

    #[tokio::test]
    async fn post_detail_skips_catalog_for_non_works_keys() {
        let id = Uuid::new_v4();
        let mut post = sample_post(id, "alice");
        post.book_api_id = Some("/books/OL1M".to_string());
        let catalog = FakeCatalog::default();
        let service = BookhubService::new(FakeStore::with_post(post), catalog.clone());

        service.post_detail(id).await.expect("detail must load");
        assert!(catalog
            .requested_keys
            .lock()
            .expect("requested_keys mutex poisoned")
            .is_empty());
    }

    #[tokio::test]
    async fn list_posts_passes_query_to_store() {
        let store = FakeStore::default();
        {
            let mut posts = store.posts.lock().expect("posts mutex poisoned");
            let mut low = sample_post(Uuid::new_v4(), "alice");
            low.title = "low".to_string();
            low.upvotes = Some(1);
            let mut high = sample_post(Uuid::new_v4(), "bob");
            high.title = "high".to_string();
            high.upvotes = Some(9);
            posts.extend([low, high]);
        }
        let service = service(store);

        let mut query = PostQuery::default();
        query.toggle_sort(bookhub_core::SortKey::Upvotes);
        let posts = service.list_posts(&query).await.expect("list must succeed");
        let titles: Vec<&str> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["high", "low"]);

        let mine = service.posts_by_user("alice").await.expect("profile posts");
        assert_eq!(mine.len(), 1);
    }
}
