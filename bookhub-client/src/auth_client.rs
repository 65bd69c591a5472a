use bookhub_core::auth::{
    OAuthProvider, PasswordGrant, RefreshGrant, SessionUser, SignUpRequest, SignUpResponse,
    TokenResponse, authorize_url,
};
use reqwest::{Method, RequestBuilder};
use tracing::debug;
use url::Url;

use crate::error::BookhubClientResult;
use crate::http_client::{HttpClient, endpoint};

#[derive(Debug, Clone)]
/// Клиент сервиса аутентификации бэкенда (`/auth/v1`).
pub(crate) struct AuthClient {
    http: HttpClient,
    base_url: String,
    anon_key: String,
}

impl AuthClient {
    pub(crate) fn new(http: HttpClient, base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            anon_key: anon_key.into(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = endpoint(&self.base_url, &format!("/auth/v1/{}", path.trim_start_matches('/')));
        self.http.request(method, &url).header("apikey", &self.anon_key)
    }

    /// Регистрирует пользователя с именем в метаданных.
    pub(crate) async fn sign_up(&self, payload: &SignUpRequest) -> BookhubClientResult<SignUpResponse> {
        debug!(email = %payload.email, "sign up");
        self.http
            .send(self.request(Method::POST, "signup").json(payload))
            .await
    }

    /// Вход по email и паролю.
    pub(crate) async fn sign_in_with_password(&self, grant: &PasswordGrant) -> BookhubClientResult<TokenResponse> {
        debug!(email = %grant.email, "sign in with password");
        let request = self
            .request(Method::POST, "token")
            .query(&[("grant_type", "password")])
            .json(grant);
        self.http.send(request).await
    }

    /// Обменивает refresh token на новую пару токенов.
    pub(crate) async fn refresh(&self, refresh_token: &str) -> BookhubClientResult<TokenResponse> {
        let grant = RefreshGrant {
            refresh_token: refresh_token.to_string(),
        };
        let request = self
            .request(Method::POST, "token")
            .query(&[("grant_type", "refresh_token")])
            .json(&grant);
        self.http.send(request).await
    }

    /// Завершает сессию на стороне бэкенда.
    pub(crate) async fn sign_out(&self, access_token: &str) -> BookhubClientResult<()> {
        let request = self
            .request(Method::POST, "logout")
            .bearer_auth(access_token);
        self.http.send_empty(request).await
    }

    /// Пользователь, которому принадлежит access token.
    pub(crate) async fn get_user(&self, access_token: &str) -> BookhubClientResult<SessionUser> {
        let request = self.request(Method::GET, "user").bearer_auth(access_token);
        self.http.send(request).await
    }

    /// URL входа через OAuth-провайдера.
    pub(crate) fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: Option<&str>,
    ) -> BookhubClientResult<Url> {
        Ok(authorize_url(&self.base_url, provider, redirect_to)?)
    }
}
