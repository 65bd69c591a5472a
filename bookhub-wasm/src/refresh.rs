/// Что делать с сессией, если обновить токен не удалось.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RefreshFailure {
    /// Бэкенд отклонил refresh token: сессия завершается.
    SignOut,
    /// Сбой сети или сервера: сессия остаётся, запрос идёт со старым токеном.
    Keep,
}

/// `status` равен `None`, если ответа не было вовсе.
pub(crate) fn refresh_failure(status: Option<u16>) -> RefreshFailure {
    match status {
        Some(400 | 401) => RefreshFailure::SignOut,
        _ => RefreshFailure::Keep,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_refresh_token_signs_out() {
        assert_eq!(refresh_failure(Some(400)), RefreshFailure::SignOut);
        assert_eq!(refresh_failure(Some(401)), RefreshFailure::SignOut);
    }

    #[test]
    fn outages_keep_session() {
        assert_eq!(refresh_failure(None), RefreshFailure::Keep);
        assert_eq!(refresh_failure(Some(503)), RefreshFailure::Keep);
        assert_eq!(refresh_failure(Some(500)), RefreshFailure::Keep);
        assert_eq!(refresh_failure(Some(429)), RefreshFailure::Keep);
    }
}
