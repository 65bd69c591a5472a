use bookhub_core::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
/// Ошибки клиентской библиотеки `bookhub-client`.
pub enum BookhubClientError {
    /// Ошибка HTTP-транспорта (`reqwest`).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Нарушено правило предметной области (валидация, права, вход).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Некорректный URL в настройках или ответе.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// Бэкенд отклонил токен.
    #[error("unauthorized")]
    Unauthorized,

    /// Бэкенд запретил операцию.
    #[error("forbidden")]
    Forbidden,

    /// Запрошенный ресурс не найден.
    #[error("not found")]
    NotFound,

    /// Некорректный запрос; сообщение взято из ответа бэкенда.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Бэкенд временно недоступен (5xx).
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// Результат операций `bookhub-client`.
pub type BookhubClientResult<T> = Result<T, BookhubClientError>;

impl BookhubClientError {
    pub(crate) fn from_http_status(status: reqwest::StatusCode, message: Option<String>) -> Self {
        match status {
            reqwest::StatusCode::UNAUTHORIZED => Self::Unauthorized,
            reqwest::StatusCode::FORBIDDEN => Self::Forbidden,
            reqwest::StatusCode::NOT_FOUND => Self::NotFound,
            _ => {
                let message = message.unwrap_or_else(|| format!("http status {status}"));
                if status.is_server_error() {
                    Self::Unavailable(message)
                } else {
                    Self::InvalidRequest(message)
                }
            }
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_http_status(status, None);
        }
        Self::Http(err)
    }

    /// Бэкенд отклонил запрос по существу (400/401), а не из-за сбоя.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::InvalidRequest(_))
    }

    /// Сообщение для показа пользователю.
    pub fn user_message(&self) -> String {
        match self {
            Self::Domain(err) => err.to_string(),
            Self::Unauthorized => "Your session has expired, please sign in again".to_string(),
            Self::Forbidden => "You don't have permission to do that".to_string(),
            Self::NotFound => "Not found".to_string(),
            Self::InvalidRequest(message) | Self::Unavailable(message) => message.clone(),
            Self::Http(err) => format!("Network error: {err}"),
            Self::Url(err) => format!("Invalid URL: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_keeps_backend_message() {
        let err = BookhubClientError::from_http_status(
            reqwest::StatusCode::BAD_REQUEST,
            Some("Invalid login credentials".to_string()),
        );
        assert!(matches!(&err, BookhubClientError::InvalidRequest(m) if m == "Invalid login credentials"));
        assert_eq!(err.user_message(), "Invalid login credentials");
    }

    #[test]
    fn status_mapping_covers_auth_and_missing() {
        assert!(matches!(
            BookhubClientError::from_http_status(reqwest::StatusCode::UNAUTHORIZED, None),
            BookhubClientError::Unauthorized
        ));
        assert!(matches!(
            BookhubClientError::from_http_status(reqwest::StatusCode::FORBIDDEN, None),
            BookhubClientError::Forbidden
        ));
        assert!(matches!(
            BookhubClientError::from_http_status(reqwest::StatusCode::NOT_FOUND, None),
            BookhubClientError::NotFound
        ));
    }

    #[test]
    fn status_mapping_falls_back_to_status_text() {
        let err = BookhubClientError::from_http_status(reqwest::StatusCode::BAD_GATEWAY, None);
        assert_eq!(err.user_message(), "http status 502 Bad Gateway");
    }

    #[test]
    fn server_errors_are_not_rejections() {
        let outage = BookhubClientError::from_http_status(reqwest::StatusCode::SERVICE_UNAVAILABLE, None);
        assert!(matches!(outage, BookhubClientError::Unavailable(_)));
        assert!(!outage.is_rejection());

        let rejected = BookhubClientError::from_http_status(
            reqwest::StatusCode::BAD_REQUEST,
            Some("Invalid Refresh Token".to_string()),
        );
        assert!(rejected.is_rejection());
        assert!(BookhubClientError::Unauthorized.is_rejection());
    }
}
