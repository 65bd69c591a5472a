//! Общая модель BookHub без ввода-вывода.
//!
//! Используется и нативным клиентом (`bookhub-client`), и браузерным UI
//! (`bookhub-wasm`): записи бэкенда, валидация форм, параметры выборки постов,
//! пагинация каталога Open Library, разбор OAuth-колбэка и форматирование дат.
#![warn(missing_docs)]

pub mod auth;
pub mod book;
pub mod comment;
pub mod date;
pub mod error;
pub mod listing;
pub mod post;
pub mod request_seq;

pub use auth::{AuthState, Session, SessionUser, SignInForm, SignUpForm};
pub use book::{BookDetails, BookRef, BookSummary, SearchPage};
pub use comment::{Comment, CommentDraft};
pub use error::DomainError;
pub use listing::{PostQuery, SortKey};
pub use post::{Post, PostDraft, PostPatch};
pub use request_seq::{RequestSeq, Ticket};
