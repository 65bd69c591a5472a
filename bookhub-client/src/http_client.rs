use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::error::{BookhubClientError, BookhubClientResult};
use crate::settings::Settings;

/// Тело ошибки бэкенда. Сервис аутентификации и REST-слой отдают сообщение
/// в разных полях.
#[derive(Debug, Default, Deserialize)]
struct ErrorResponseDto {
    error: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl ErrorResponseDto {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
            .filter(|message| !message.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
/// Общий HTTP-клиент с таймаутами и разбором ошибок.
pub(crate) struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Создаёт клиент с таймаутами из настроек.
    pub(crate) fn new(settings: &Settings) -> BookhubClientResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(settings.http_connect_timeout_secs))
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .user_agent(concat!("bookhub/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    pub(crate) fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url)
    }

    async fn decode_error(response: reqwest::Response) -> BookhubClientError {
        let status = response.status();

        let message = response
            .json::<ErrorResponseDto>()
            .await
            .ok()
            .and_then(ErrorResponseDto::into_message);
        BookhubClientError::from_http_status(status, message)
    }

    async fn execute(&self, request: RequestBuilder) -> BookhubClientResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(BookhubClientError::from_reqwest)?;
        debug!(status = %response.status(), url = %response.url(), "response received");

        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }
        Ok(response)
    }

    /// Отправляет запрос и декодирует JSON-ответ.
    pub(crate) async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> BookhubClientResult<T> {
        self.execute(request)
            .await?
            .json::<T>()
            .await
            .map_err(BookhubClientError::from_reqwest)
    }

    /// Отправляет запрос, тело ответа не нужно.
    pub(crate) async fn send_empty(&self, request: RequestBuilder) -> BookhubClientResult<()> {
        self.execute(request).await?;
        Ok(())
    }
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
