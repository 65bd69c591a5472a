use anyhow::{Context, Result, anyhow};
use bookhub_core::book::{COVERS_URL, OPEN_LIBRARY_URL};

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
/// Настройки клиента: адреса бэкенда и каталога, таймауты.
pub struct Settings {
    /// Базовый URL проекта бэкенда, например `https://xyz.supabase.co`.
    pub supabase_url: String,
    /// Публичный (anon) ключ проекта.
    pub supabase_anon_key: String,
    /// Базовый URL каталога.
    pub open_library_url: String,
    /// Базовый URL сервиса обложек.
    pub covers_url: String,
    /// Куда провайдер OAuth возвращает пользователя.
    pub oauth_redirect_url: Option<String>,
    /// Таймаут установки соединения, секунды.
    pub http_connect_timeout_secs: u64,
    /// Таймаут запроса целиком, секунды.
    pub http_timeout_secs: u64,
    /// Уровень логирования по умолчанию.
    pub log_level: String,
}

impl Settings {
    /// Настройки с адресом бэкенда и значениями по умолчанию для остального.
    pub fn new(supabase_url: impl Into<String>, supabase_anon_key: impl Into<String>) -> Self {
        Self {
            supabase_url: supabase_url.into(),
            supabase_anon_key: supabase_anon_key.into(),
            open_library_url: OPEN_LIBRARY_URL.to_string(),
            covers_url: COVERS_URL.to_string(),
            oauth_redirect_url: None,
            http_connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            http_timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_level: "warn".to_string(),
        }
    }

    /// Читает настройки из окружения (`.env` загружается вызывающей стороной).
    pub fn from_env() -> Result<Self> {
        let supabase_url = get_required("SUPABASE_URL").context("SUPABASE_URL is required")?;
        let supabase_anon_key =
            get_required("SUPABASE_ANON_KEY").context("SUPABASE_ANON_KEY is required")?;

        if !supabase_url.starts_with("http://") && !supabase_url.starts_with("https://") {
            return Err(anyhow!("SUPABASE_URL must start with http:// or https://"));
        }

        let open_library_url =
            std::env::var("OPEN_LIBRARY_URL").unwrap_or_else(|_| OPEN_LIBRARY_URL.to_string());
        let covers_url =
            std::env::var("OPEN_LIBRARY_COVERS_URL").unwrap_or_else(|_| COVERS_URL.to_string());
        let oauth_redirect_url = std::env::var("OAUTH_REDIRECT_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let http_connect_timeout_secs = parse_u64_value(
            "HTTP_CONNECT_TIMEOUT_SECS",
            std::env::var("HTTP_CONNECT_TIMEOUT_SECS").ok(),
            DEFAULT_CONNECT_TIMEOUT_SECS,
        )?;
        let http_timeout_secs = parse_u64_value(
            "HTTP_TIMEOUT_SECS",
            std::env::var("HTTP_TIMEOUT_SECS").ok(),
            DEFAULT_TIMEOUT_SECS,
        )?;
        let log_level = std::env::var("LOG_LEVEL")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "warn".to_string());

        Ok(Self {
            supabase_url,
            supabase_anon_key,
            open_library_url,
            covers_url,
            oauth_redirect_url,
            http_connect_timeout_secs,
            http_timeout_secs,
            log_level,
        })
    }
}

fn get_required(key: &str) -> Result<String> {
    let value = std::env::var(key)?;
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(anyhow!("{key} must not be empty"));
    }
    Ok(value)
}

fn parse_u64_value(key: &str, raw: Option<String>, default: u64) -> Result<u64> {
    let value = raw
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse::<u64>()
        .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?;

    if value == 0 {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}
