//! Клиентская библиотека BookHub.
//!
//! Предоставляет единый API (`BookhubClient`) поверх трёх HTTP-сервисов:
//! - аутентификация бэкенда (`/auth/v1`)
//! - таблицы постов и комментариев (`/rest/v1`)
//! - каталог Open Library
//!
//! Клиент хранит сессию после `sign_in`/`complete_oauth`, сам обновляет
//! истекающий токен и публикует смену состояния входа в канал `watch`.
#![warn(missing_docs)]

mod auth_client;
mod catalog_client;
mod error;
mod http_client;
mod rest_client;
mod service;
mod settings;
mod store;

pub use bookhub_core::auth::OAuthProvider;
pub use bookhub_core::{
    AuthState, BookDetails, BookRef, BookSummary, Comment, CommentDraft, DomainError, Post,
    PostDraft, PostPatch, PostQuery, SearchPage, Session, SessionUser, SignInForm, SignUpForm,
    SortKey,
};
pub use error::{BookhubClientError, BookhubClientResult};
pub use service::PostDetail;
pub use settings::Settings;
pub use store::{BookCatalog, CommentStore, PostStore};

use auth_client::AuthClient;
use bookhub_core::auth::{CallbackTokens, SignUpResponse};
use catalog_client::CatalogClient;
use chrono::Utc;
use http_client::HttpClient;
use rest_client::RestClient;
use service::BookhubService;
use tokio::sync::watch;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Итог регистрации.
pub enum SignUpOutcome {
    /// Бэкенд сразу выдал сессию.
    SignedIn(SessionUser),
    /// Нужно подтвердить email по ссылке из письма.
    ConfirmationRequired {
        /// Адрес, на который ушло письмо.
        email: String,
    },
}

/// Клиент BookHub с сессией пользователя.
pub struct BookhubClient {
    settings: Settings,
    auth: AuthClient,
    service: BookhubService<RestClient, CatalogClient>,
    session: Option<Session>,
    auth_state: watch::Sender<AuthState>,
}

impl BookhubClient {
    /// Создаёт клиент; сессии нет, пока не выполнен вход или `set_session`.
    pub fn new(settings: Settings) -> BookhubClientResult<Self> {
        let http = HttpClient::new(&settings)?;
        let auth = AuthClient::new(
            http.clone(),
            settings.supabase_url.clone(),
            settings.supabase_anon_key.clone(),
        );
        let rest = RestClient::new(
            http.clone(),
            settings.supabase_url.clone(),
            settings.supabase_anon_key.clone(),
        );
        let catalog = CatalogClient::new(
            http,
            settings.open_library_url.clone(),
            settings.covers_url.clone(),
        );
        let (auth_state, _) = watch::channel(AuthState::SignedOut);

        Ok(Self {
            settings,
            auth,
            service: BookhubService::new(rest, catalog),
            session: None,
            auth_state,
        })
    }

    /// Настройки, с которыми создан клиент.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Текущая сессия, если пользователь вошёл.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Пользователь текущей сессии.
    pub fn current_user(&self) -> Option<&SessionUser> {
        self.session.as_ref().map(|session| &session.user)
    }

    /// Устанавливает сохранённую ранее сессию.
    pub fn set_session(&mut self, session: Session) {
        self.auth_state
            .send_replace(AuthState::SignedIn(session.user.clone()));
        self.session = Some(session);
    }

    /// Забывает сессию локально.
    pub fn clear_session(&mut self) {
        self.session = None;
        self.auth_state.send_replace(AuthState::SignedOut);
    }

    /// Текущее состояние входа.
    pub fn auth_state(&self) -> AuthState {
        self.auth_state.borrow().clone()
    }

    /// Подписка на смену состояния входа.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.auth_state.subscribe()
    }

    /// Регистрирует пользователя. Если бэкенд требует подтверждения email,
    /// сессия не создаётся.
    pub async fn sign_up(&mut self, form: SignUpForm) -> BookhubClientResult<SignUpOutcome> {
        let request = form.validate()?;
        match self.auth.sign_up(&request).await? {
            SignUpResponse::Session(tokens) => {
                let session = Session::from_token_response(tokens, Utc::now());
                let user = session.user.clone();
                info!(user_id = %user.id, "signed up");
                self.set_session(session);
                Ok(SignUpOutcome::SignedIn(user))
            }
            SignUpResponse::PendingConfirmation(user) => Ok(SignUpOutcome::ConfirmationRequired {
                email: user.email.unwrap_or(request.email),
            }),
        }
    }

    /// Вход по email и паролю.
    pub async fn sign_in(&mut self, form: SignInForm) -> BookhubClientResult<SessionUser> {
        let grant = form.validate()?;
        let tokens = self.auth.sign_in_with_password(&grant).await?;
        let session = Session::from_token_response(tokens, Utc::now());
        let user = session.user.clone();
        info!(user_id = %user.id, "signed in");
        self.set_session(session);
        Ok(user)
    }

    /// URL, по которому пользователь уходит к OAuth-провайдеру. Без явного
    /// `redirect_to` берётся `OAUTH_REDIRECT_URL` из настроек.
    pub fn oauth_url(
        &self,
        provider: OAuthProvider,
        redirect_to: Option<&str>,
    ) -> BookhubClientResult<Url> {
        let redirect_to = redirect_to.or(self.settings.oauth_redirect_url.as_deref());
        self.auth.authorize_url(provider, redirect_to)
    }

    /// Завершает OAuth-вход по URL, на который провайдер вернул пользователя.
    pub async fn complete_oauth(&mut self, callback_url: &str) -> BookhubClientResult<SessionUser> {
        let tokens = CallbackTokens::from_url(callback_url)?;
        let user = self.auth.get_user(&tokens.access_token).await?;
        let session = tokens.into_session(user, Utc::now());
        let user = session.user.clone();
        info!(user_id = %user.id, "signed in with oauth");
        self.set_session(session);
        Ok(user)
    }

    /// Обновляет токен, если он скоро истекает. Возвращает `true`, если сессия
    /// изменилась. Отклонённый refresh token (400/401) завершает сессию;
    /// при сбое сети или 5xx сессия остаётся.
    pub async fn refresh_if_needed(&mut self) -> BookhubClientResult<bool> {
        let Some(session) = &self.session else {
            return Ok(false);
        };
        if !session.expires_soon(Utc::now()) {
            return Ok(false);
        }

        match self.auth.refresh(&session.refresh_token).await {
            Ok(tokens) => {
                self.set_session(Session::from_token_response(tokens, Utc::now()));
                Ok(true)
            }
            Err(err) if err.is_rejection() => {
                warn!(error = %err, "refresh token rejected, signing out");
                self.clear_session();
                Err(err)
            }
            Err(err) => {
                warn!(error = %err, "refresh failed, keeping session");
                Err(err)
            }
        }
    }

    /// Проверяет сессию на бэкенде и обновляет данные пользователя.
    pub async fn fetch_user(&mut self) -> BookhubClientResult<SessionUser> {
        let token = self.access_token()?.to_string();
        let user = self.auth.get_user(&token).await?;
        if let Some(session) = self.session.as_mut() {
            session.user = user.clone();
        }
        self.auth_state
            .send_replace(AuthState::SignedIn(user.clone()));
        Ok(user)
    }

    /// Выход. Ошибка удалённого выхода только логируется: локально сессия
    /// очищается всегда.
    pub async fn sign_out(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(err) = self.auth.sign_out(&session.access_token).await {
                warn!(error = %err, "remote sign out failed");
            }
            info!(user_id = %session.user.id, "signed out");
        }
        self.clear_session();
    }

    fn access_token(&self) -> BookhubClientResult<&str> {
        self.session
            .as_ref()
            .map(|session| session.access_token.as_str())
            .ok_or_else(|| DomainError::Unauthorized("Please sign in first").into())
    }

    /// Лента постов.
    pub async fn list_posts(&self, query: &PostQuery) -> BookhubClientResult<Vec<Post>> {
        self.service.list_posts(query).await
    }

    /// Пост по идентификатору.
    pub async fn get_post(&self, id: Uuid) -> BookhubClientResult<Post> {
        self.service.get_post(id).await
    }

    /// Пост с комментариями и подробностями книги.
    pub async fn post_detail(&self, id: Uuid) -> BookhubClientResult<PostDetail> {
        self.service.post_detail(id).await
    }

    /// Создаёт пост от имени текущего пользователя.
    pub async fn create_post(&self, draft: PostDraft) -> BookhubClientResult<Post> {
        self.service.create_post(self.session.as_ref(), draft).await
    }

    /// Обновляет свой пост.
    pub async fn update_post(&self, id: Uuid, patch: PostPatch) -> BookhubClientResult<Post> {
        self.service
            .update_post(self.session.as_ref(), id, patch)
            .await
    }

    /// Удаляет свой пост вместе с комментариями.
    pub async fn delete_post(&self, id: Uuid) -> BookhubClientResult<()> {
        self.service.delete_post(self.session.as_ref(), id).await
    }

    /// Голос за пост.
    pub async fn upvote(&self, id: Uuid) -> BookhubClientResult<Post> {
        self.service.upvote(self.session.as_ref(), id).await
    }

    /// Добавляет комментарий.
    pub async fn add_comment(&self, draft: CommentDraft) -> BookhubClientResult<Comment> {
        self.service.add_comment(self.session.as_ref(), draft).await
    }

    /// Удаляет свой комментарий.
    pub async fn delete_comment(&self, id: Uuid) -> BookhubClientResult<()> {
        self.service.delete_comment(self.session.as_ref(), id).await
    }

    /// Посты текущего пользователя, новые первыми.
    pub async fn my_posts(&self) -> BookhubClientResult<Vec<Post>> {
        let user = self
            .current_user()
            .ok_or(DomainError::Unauthorized("Please sign in to view your profile"))?;
        self.service.posts_by_user(&user.id).await
    }

    /// Поиск книг в каталоге.
    pub async fn search_books(
        &self,
        query: &str,
        page: u32,
        limit: u32,
    ) -> BookhubClientResult<SearchPage> {
        self.service.search_books(query, page, limit).await
    }

    /// Подробности произведения по ключу (`/works/OL...W` или `OL...W`).
    pub async fn book_details(&self, key: &str) -> BookhubClientResult<BookDetails> {
        self.service.book_details(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookhub_core::auth::UserMetadata;

    fn client() -> BookhubClient {
        BookhubClient::new(Settings::new("http://127.0.0.1:9", "anon"))
            .expect("client must build")
    }

    fn session() -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: None,
            user: SessionUser {
                id: "user-1".to_string(),
                email: Some("reader@example.com".to_string()),
                user_metadata: UserMetadata::default(),
            },
        }
    }

    #[test]
    fn set_and_clear_session_publish_auth_state() {
        let mut client = client();
        let mut rx = client.subscribe();
        assert_eq!(*rx.borrow_and_update(), AuthState::SignedOut);

        client.set_session(session());
        assert!(rx.has_changed().expect("sender alive"));
        assert_eq!(
            rx.borrow_and_update().user().map(|u| u.id.as_str()),
            Some("user-1")
        );

        client.clear_session();
        assert_eq!(*rx.borrow_and_update(), AuthState::SignedOut);
        assert!(client.session().is_none());
    }

    #[test]
    fn oauth_url_falls_back_to_configured_redirect() {
        let mut settings = Settings::new("https://project.supabase.co", "anon");
        settings.oauth_redirect_url = Some("http://localhost:8080/".to_string());
        let client = BookhubClient::new(settings).expect("client must build");

        let url = client
            .oauth_url(OAuthProvider::Github, None)
            .expect("url must build");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("provider".to_string(), "github".to_string())));
        assert!(pairs.contains(&(
            "redirect_to".to_string(),
            "http://localhost:8080/".to_string()
        )));
    }

    #[tokio::test]
    async fn my_posts_requires_session() {
        let client = client();
        let err = client.my_posts().await.expect_err("anonymous profile");
        assert!(matches!(
            err,
            BookhubClientError::Domain(DomainError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn refresh_is_skipped_for_fresh_session() {
        let mut client = client();
        let mut fresh = session();
        fresh.expires_at = Some(Utc::now() + chrono::Duration::hours(1));
        client.set_session(fresh);

        let refreshed = client.refresh_if_needed().await.expect("no network needed");
        assert!(!refreshed);
    }
}
