use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Ошибки предметной области, общие для CLI и веб-клиента.
pub enum DomainError {
    /// Поле формы не прошло проверку.
    #[error("{message}")]
    Validation {
        /// Имя поля формы.
        field: &'static str,
        /// Текст, который показывается пользователю.
        message: &'static str,
    },

    /// Запись не найдена.
    #[error("not found: {0}")]
    NotFound(String),

    /// Операция доступна только автору записи.
    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    /// Операция требует входа в систему.
    #[error("{0}")]
    Unauthorized(&'static str),

    /// Провайдер OAuth вернул ошибку или неполный ответ.
    #[error("oauth error: {0}")]
    OAuth(String),
}

impl DomainError {
    /// Имя поля для ошибок валидации.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}
