use bookhub_core::{BookSummary, RequestSeq, Session, SessionUser};
use chrono::Utc;
use leptos::prelude::*;
use uuid::Uuid;
use wasm_bindgen::JsValue;

use crate::api;
use crate::refresh::{RefreshFailure, refresh_failure};
use crate::storage;

/// Экран приложения.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum View {
    Home,
    Explore,
    CreatePost,
    Post(Uuid),
    Profile,
    Auth,
}

#[derive(Debug, Clone)]
pub(crate) struct AppState {
    pub(crate) session: RwSignal<Option<Session>>,
    pub(crate) view: RwSignal<View>,
    pub(crate) error: RwSignal<Option<String>>,
    pub(crate) notice: RwSignal<Option<String>>,
    pub(crate) loading: RwSignal<bool>,
    /// Книга, выбранная в каталоге для нового поста.
    pub(crate) pending_book: RwSignal<Option<BookSummary>>,
    pub(crate) feed_seq: RequestSeq,
    pub(crate) search_seq: RequestSeq,
}

impl AppState {
    pub(crate) fn new() -> Self {
        Self {
            session: RwSignal::new(None),
            view: RwSignal::new(View::Home),
            error: RwSignal::new(None),
            notice: RwSignal::new(None),
            loading: RwSignal::new(false),
            pending_book: RwSignal::new(None),
            feed_seq: RequestSeq::new(),
            search_seq: RequestSeq::new(),
        }
    }

    pub(crate) fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        web_sys::console::error_1(&JsValue::from_str(&message));
        self.error.set(Some(message));
    }

    pub(crate) fn clear_error(&self) {
        self.error.set(None);
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.session.with(Option::is_some)
    }

    pub(crate) fn user(&self) -> Option<SessionUser> {
        self.session.with(|s| s.as_ref().map(|s| s.user.clone()))
    }

    pub(crate) fn token(&self) -> Option<String> {
        self.session.with(|s| s.as_ref().map(|s| s.access_token.clone()))
    }

    pub(crate) fn is_author(&self, user_id: Option<&str>) -> bool {
        match (self.user(), user_id) {
            (Some(user), Some(author)) => user.id == author,
            _ => false,
        }
    }

    pub(crate) fn navigate(&self, view: View) {
        self.clear_error();
        self.notice.set(None);
        self.view.set(view);
    }

    /// Сохраняет сессию в localStorage и публикует её в сигнал.
    pub(crate) fn sign_in(&self, session: Session) {
        if let Err(err) = storage::save_session(&session) {
            self.set_error(err);
        }
        self.session.set(Some(session));
    }

    pub(crate) fn sign_out_locally(&self) {
        if let Err(err) = storage::clear_session() {
            self.set_error(err);
        }
        self.session.set(None);
    }

    /// Сессия для запроса от имени пользователя. Истекающий токен сначала
    /// обновляется; `None`, если пользователь не вошёл или refresh отклонён.
    pub(crate) async fn fresh_session(&self) -> Option<Session> {
        let session = self.session.get_untracked()?;
        if !session.expires_soon(Utc::now()) {
            return Some(session);
        }

        match api::refresh(&session.refresh_token).await {
            Ok(tokens) => {
                let refreshed = Session::from_token_response(tokens, Utc::now());
                self.sign_in(refreshed.clone());
                Some(refreshed)
            }
            Err(err) => match refresh_failure(err.status()) {
                RefreshFailure::SignOut => {
                    self.sign_out_locally();
                    self.set_error("Your session has expired, please sign in again");
                    None
                }
                RefreshFailure::Keep => {
                    web_sys::console::warn_1(&JsValue::from_str(&format!(
                        "session refresh failed: {err}"
                    )));
                    Some(session)
                }
            },
        }
    }
}
