//! Сессия пользователя, формы входа/регистрации и разбор OAuth-колбэка.
//!
//! Сам протокол аутентификации принадлежит бэкенду; здесь только то, что
//! клиент отправляет и как он хранит полученные токены.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use validator::ValidateEmail;

use crate::error::DomainError;

/// Минимальная длина пароля при регистрации.
pub const MIN_PASSWORD_LEN: usize = 6;

/// За сколько секунд до истечения токен считается устаревшим.
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// Метаданные пользователя, заданные при регистрации.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetadata {
    /// Имя пользователя.
    #[serde(default)]
    pub username: Option<String>,
}

/// Пользователь текущей сессии.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Идентификатор пользователя в бэкенде.
    pub id: String,
    /// Email.
    #[serde(default)]
    pub email: Option<String>,
    /// Метаданные.
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl SessionUser {
    /// Имя из метаданных, иначе часть email до `@`, иначе идентификатор.
    pub fn display_name(&self) -> String {
        if let Some(username) = self
            .user_metadata
            .username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
        {
            return username.to_string();
        }
        match self.email.as_deref() {
            Some(email) if !email.is_empty() => {
                email.split('@').next().unwrap_or(email).to_string()
            }
            _ => self.id.clone(),
        }
    }

    /// Буква для аватара.
    pub fn initial(&self) -> char {
        self.email
            .as_deref()
            .and_then(|email| email.chars().next())
            .or_else(|| self.display_name().chars().next())
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('?')
    }
}

/// Сохранённая сессия.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Access token для заголовка `Authorization`.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Момент истечения access token.
    pub expires_at: Option<DateTime<Utc>>,
    /// Пользователь.
    pub user: SessionUser,
}

impl Session {
    /// Сессия из ответа выдачи токена.
    pub fn from_token_response(response: TokenResponse, now: DateTime<Utc>) -> Self {
        let expires_at = expiry(response.expires_at, response.expires_in, now);
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at,
            user: response.user,
        }
    }

    /// Истекает ли токен в ближайшие [`REFRESH_MARGIN_SECS`] секунд.
    pub fn expires_soon(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .map(|at| at - now < Duration::seconds(REFRESH_MARGIN_SECS))
            .unwrap_or(false)
    }
}

/// Ответ `POST /auth/v1/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Время жизни в секундах.
    pub expires_in: Option<i64>,
    /// Момент истечения, unix-секунды.
    pub expires_at: Option<i64>,
    /// Пользователь.
    pub user: SessionUser,
}

/// Ответ регистрации: сессия, если подтверждение email выключено, иначе только
/// пользователь.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    /// Пользователь сразу вошёл.
    Session(TokenResponse),
    /// Нужно подтвердить email.
    PendingConfirmation(SessionUser),
}

/// Событие изменения состояния аутентификации.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    /// Пользователь не вошёл.
    #[default]
    SignedOut,
    /// Пользователь вошёл.
    SignedIn(SessionUser),
}

impl AuthState {
    /// Пользователь, если он вошёл.
    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            Self::SignedIn(user) => Some(user),
            Self::SignedOut => None,
        }
    }
}

/// Форма регистрации.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpForm {
    /// Email.
    pub email: String,
    /// Пароль.
    pub password: String,
    /// Подтверждение пароля.
    pub confirm_password: String,
    /// Имя пользователя.
    pub username: String,
}

impl SignUpForm {
    /// Проверяет форму и строит тело запроса регистрации.
    pub fn validate(self) -> Result<SignUpRequest, DomainError> {
        if self.password != self.confirm_password {
            return Err(DomainError::Validation {
                field: "confirm_password",
                message: "Passwords do not match",
            });
        }
        let username = self.username.trim();
        if username.is_empty() {
            return Err(DomainError::Validation {
                field: "username",
                message: "Username is required",
            });
        }
        let email = normalize_email(&self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::Validation {
                field: "password",
                message: "Password must be at least 6 characters",
            });
        }
        Ok(SignUpRequest {
            email,
            password: self.password,
            data: UserMetadata {
                username: Some(username.to_string()),
            },
        })
    }
}

/// Тело `POST /auth/v1/signup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignUpRequest {
    /// Email.
    pub email: String,
    /// Пароль.
    pub password: String,
    /// Метаданные пользователя.
    pub data: UserMetadata,
}

/// Форма входа по паролю.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignInForm {
    /// Email.
    pub email: String,
    /// Пароль.
    pub password: String,
}

impl SignInForm {
    /// Проверяет форму и строит тело запроса.
    pub fn validate(self) -> Result<PasswordGrant, DomainError> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(DomainError::Validation {
                field: "email",
                message: "Email is required",
            });
        }
        if self.password.is_empty() {
            return Err(DomainError::Validation {
                field: "password",
                message: "Password is required",
            });
        }
        Ok(PasswordGrant {
            email: email.to_lowercase(),
            password: self.password,
        })
    }
}

/// Тело `grant_type=password`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordGrant {
    /// Email.
    pub email: String,
    /// Пароль.
    pub password: String,
}

/// Тело `grant_type=refresh_token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshGrant {
    /// Refresh token.
    pub refresh_token: String,
}

/// Поддерживаемые OAuth-провайдеры.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    /// Google.
    Google,
    /// GitHub.
    Github,
}

impl OAuthProvider {
    /// Имя провайдера в бэкенде.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Github => "github",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthProvider {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "github" => Ok(Self::Github),
            other => Err(format!("unsupported oauth provider: {other}")),
        }
    }
}

/// URL, на который отправляется пользователь для входа через провайдера.
pub fn authorize_url(
    backend_url: &str,
    provider: OAuthProvider,
    redirect_to: Option<&str>,
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&format!(
        "{}/auth/v1/authorize",
        backend_url.trim_end_matches('/')
    ))?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("provider", provider.as_str());
        if let Some(redirect_to) = redirect_to {
            pairs.append_pair("redirect_to", redirect_to);
        }
    }
    Ok(url)
}

/// Токены из фрагмента URL, на который провайдер вернул пользователя.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackTokens {
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Время жизни в секундах.
    pub expires_in: Option<i64>,
    /// Момент истечения, unix-секунды.
    pub expires_at: Option<i64>,
}

impl CallbackTokens {
    /// Разбирает полный URL колбэка.
    ///
    /// Ошибку провайдер может вернуть как в query, так и во фрагменте.
    pub fn from_url(raw: &str) -> Result<Self, DomainError> {
        let url = Url::parse(raw.trim())
            .map_err(|err| DomainError::OAuth(format!("invalid callback url: {err}")))?;
        if let Some(message) = error_message(url.query().unwrap_or_default()) {
            return Err(DomainError::OAuth(message));
        }
        Self::from_fragment(url.fragment().unwrap_or_default())
    }

    /// Разбирает фрагмент (`#access_token=...`); ведущий `#` допускается.
    pub fn from_fragment(fragment: &str) -> Result<Self, DomainError> {
        let fragment = fragment.trim_start_matches('#');
        if let Some(message) = error_message(fragment) {
            return Err(DomainError::OAuth(message));
        }

        let mut access_token = None;
        let mut refresh_token = None;
        let mut expires_in = None;
        let mut expires_at = None;
        for (key, value) in url::form_urlencoded::parse(fragment.as_bytes()) {
            match key.as_ref() {
                "access_token" => access_token = Some(value.into_owned()),
                "refresh_token" => refresh_token = Some(value.into_owned()),
                "expires_in" => expires_in = value.parse().ok(),
                "expires_at" => expires_at = value.parse().ok(),
                _ => {}
            }
        }

        match (access_token, refresh_token) {
            (Some(access_token), Some(refresh_token))
                if !access_token.is_empty() && !refresh_token.is_empty() =>
            {
                Ok(Self {
                    access_token,
                    refresh_token,
                    expires_in,
                    expires_at,
                })
            }
            _ => Err(DomainError::OAuth(
                "callback does not contain session tokens".to_string(),
            )),
        }
    }

    /// Похож ли фрагмент на ответ провайдера: есть ключ `access_token`,
    /// `error` или `error_description`. Прочие якоря страницы не трогаются.
    pub fn is_callback_fragment(fragment: &str) -> bool {
        let fragment = fragment.trim_start_matches('#');
        url::form_urlencoded::parse(fragment.as_bytes()).any(|(key, _)| {
            matches!(key.as_ref(), "access_token" | "error" | "error_description")
        })
    }

    /// Собирает сессию, когда пользователь уже получен по access token.
    pub fn into_session(self, user: SessionUser, now: DateTime<Utc>) -> Session {
        Session {
            expires_at: expiry(self.expires_at, self.expires_in, now),
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            user,
        }
    }
}

fn error_message(params: &str) -> Option<String> {
    let mut error = None;
    let mut description = None;
    for (key, value) in url::form_urlencoded::parse(params.as_bytes()) {
        match key.as_ref() {
            "error" => error = Some(value.into_owned()),
            "error_description" => description = Some(value.into_owned()),
            _ => {}
        }
    }
    description.or(error)
}

fn expiry(expires_at: Option<i64>, expires_in: Option<i64>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if let Some(at) = expires_at.and_then(|secs| DateTime::from_timestamp(secs, 0)) {
        return Some(at);
    }
    expires_in.map(|secs| now + Duration::seconds(secs))
}

fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim().to_lowercase();
    if !email.validate_email() {
        return Err(DomainError::Validation {
            field: "email",
            message: "Enter a valid email",
        });
    }
    Ok(email)
}
