//! Модели каталога Open Library и расчёт пагинации.
//!
//! Каталог только читается: выбранные поля книги копируются в пост через
//! [`BookRef`] и больше нигде не сохраняются.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::DomainError;

/// Базовый адрес каталога.
pub const OPEN_LIBRARY_URL: &str = "https://openlibrary.org";
/// Базовый адрес сервиса обложек.
pub const COVERS_URL: &str = "https://covers.openlibrary.org";
/// Запрос, с которого стартует обзор каталога.
pub const DEFAULT_EXPLORE_QUERY: &str = "fantasy fiction";
/// Размер страницы в обзоре каталога.
pub const EXPLORER_PAGE_SIZE: u32 = 12;
/// Размер выдачи во встроенном поиске книги для поста.
pub const PICKER_PAGE_SIZE: u32 = 10;
/// Сколько тем книги показывать в свёрнутом виде.
pub const SUBJECTS_PREVIEW: usize = 5;
/// Подпись для книги без авторов.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

const WORKS_PREFIX: &str = "/works/";

/// Ответ `GET /search.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    /// Общее число найденных документов.
    #[serde(rename = "numFound", default)]
    pub num_found: u64,
    /// Документы текущей страницы.
    #[serde(default)]
    pub docs: Vec<SearchDoc>,
}

/// Один документ поисковой выдачи.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchDoc {
    /// Ключ произведения, например `/works/OL45883W`.
    pub key: String,
    /// Название.
    #[serde(default)]
    pub title: String,
    /// Имена авторов.
    #[serde(default)]
    pub author_name: Vec<String>,
    /// Идентификатор обложки.
    pub cover_i: Option<i64>,
    /// Год первой публикации.
    pub first_publish_year: Option<i32>,
    /// Коды языков.
    #[serde(default)]
    pub language: Vec<String>,
}

/// Ответ `GET /works/{id}.json` (используемые поля).
#[derive(Debug, Clone, Deserialize)]
pub struct WorkResponse {
    /// Ключ произведения.
    pub key: Option<String>,
    /// Название.
    pub title: Option<String>,
    /// Описание: строка или объект `{ "type", "value" }`.
    pub description: Option<Description>,
    /// Темы.
    #[serde(default)]
    pub subjects: Vec<String>,
    /// Идентификаторы обложек.
    #[serde(default)]
    pub covers: Vec<i64>,
    /// Дата первой публикации в свободной форме.
    pub first_publish_date: Option<String>,
}

/// Описание произведения в одном из двух форматов каталога.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Description {
    /// Простая строка.
    Text(String),
    /// Текстовый блок с типом.
    Typed {
        /// Текст описания.
        value: String,
    },
}

impl Description {
    /// Текст описания независимо от формата.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Typed { value } => value,
        }
    }
}

/// Книга из поисковой выдачи в том виде, в каком её показывает UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSummary {
    /// Ключ произведения.
    pub id: String,
    /// Название.
    pub title: String,
    /// Имена авторов (может быть пустым).
    pub authors: Vec<String>,
    /// Идентификатор обложки.
    pub cover_id: Option<i64>,
    /// Готовый URL обложки среднего размера.
    pub cover_url: Option<String>,
    /// Год первой публикации.
    pub first_publish_year: Option<i32>,
    /// Первый из языков издания.
    pub language: Option<String>,
}

impl BookSummary {
    /// Строит карточку из документа выдачи.
    pub fn from_doc(doc: SearchDoc, covers_base: &str) -> Self {
        let cover_url = doc.cover_i.map(|id| cover_url(covers_base, id));
        Self {
            id: doc.key,
            title: doc.title,
            authors: doc.author_name,
            cover_id: doc.cover_i,
            cover_url,
            first_publish_year: doc.first_publish_year,
            language: doc.language.into_iter().next(),
        }
    }

    /// Первый автор или [`UNKNOWN_AUTHOR`].
    pub fn primary_author(&self) -> &str {
        self.authors
            .first()
            .map(String::as_str)
            .unwrap_or(UNKNOWN_AUTHOR)
    }

    /// Все авторы через запятую или [`UNKNOWN_AUTHOR`].
    pub fn author_line(&self) -> String {
        if self.authors.is_empty() {
            return UNKNOWN_AUTHOR.to_string();
        }
        self.authors.join(", ")
    }
}

/// Ссылка на книгу, которая копируется в пост.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRef {
    /// Ключ произведения в каталоге.
    pub api_id: String,
    /// Название книги.
    pub title: String,
    /// Авторы через запятую.
    pub author: Option<String>,
}

impl From<&BookSummary> for BookRef {
    fn from(book: &BookSummary) -> Self {
        let author = if book.authors.is_empty() {
            None
        } else {
            Some(book.authors.join(", "))
        };
        Self {
            api_id: book.id.clone(),
            title: book.title.clone(),
            author,
        }
    }
}

/// Подробности произведения.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDetails {
    /// Ключ произведения.
    pub key: Option<String>,
    /// Название.
    pub title: Option<String>,
    /// Описание, приведённое к строке; пустое описание считается отсутствующим.
    pub description: Option<String>,
    /// Темы.
    pub subjects: Vec<String>,
    /// Идентификаторы обложек.
    pub covers: Vec<i64>,
    /// Дата первой публикации.
    pub first_publish_date: Option<String>,
}

impl From<WorkResponse> for BookDetails {
    fn from(work: WorkResponse) -> Self {
        let description = work
            .description
            .map(Description::into_text)
            .filter(|text| !text.trim().is_empty());
        Self {
            key: work.key,
            title: work.title,
            description,
            subjects: work.subjects,
            covers: work.covers,
            first_publish_date: work.first_publish_date,
        }
    }
}

impl BookDetails {
    /// Темы, видимые в текущем состоянии переключателя.
    pub fn visible_subjects(&self, expanded: bool) -> &[String] {
        if expanded {
            return &self.subjects;
        }
        let end = self.subjects.len().min(SUBJECTS_PREVIEW);
        &self.subjects[..end]
    }

    /// Сколько тем скрыто (для подписи `+N more`).
    pub fn hidden_subjects(&self, expanded: bool) -> usize {
        self.subjects.len() - self.visible_subjects(expanded).len()
    }

    /// Нужна ли кнопка `Show less`.
    pub fn can_collapse(&self, expanded: bool) -> bool {
        expanded && self.subjects.len() > SUBJECTS_PREVIEW
    }
}

/// Страница поисковой выдачи.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Книги текущей страницы.
    pub books: Vec<BookSummary>,
    /// Общее число результатов.
    pub total: u64,
    /// Номер страницы, начиная с 1.
    pub page: u32,
    /// Размер страницы.
    pub limit: u32,
}

impl SearchPage {
    /// Собирает страницу из ответа каталога.
    pub fn from_response(response: SearchResponse, page: u32, limit: u32, covers_base: &str) -> Self {
        Self {
            books: response
                .docs
                .into_iter()
                .map(|doc| BookSummary::from_doc(doc, covers_base))
                .collect(),
            total: response.num_found,
            page: page.max(1),
            limit,
        }
    }

    /// Число страниц для отображения (минимум 1).
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 1;
        }
        self.total.div_ceil(u64::from(self.limit)).max(1)
    }

    /// Есть ли предыдущая страница.
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Есть ли следующая страница.
    pub fn has_next(&self) -> bool {
        u64::from(self.page) * u64::from(self.limit) < self.total
    }
}

/// Проверяет поисковую строку и возвращает её без крайних пробелов.
pub fn normalize_query(query: &str) -> Result<String, DomainError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(DomainError::Validation {
            field: "query",
            message: "Search query is required",
        });
    }
    Ok(query.to_string())
}

/// Смещение выдачи для страницы `page` (нумерация с 1).
pub fn search_offset(page: u32, limit: u32) -> u32 {
    page.max(1).saturating_sub(1).saturating_mul(limit)
}

/// URL поискового запроса.
pub fn search_url(base: &str, query: &str, page: u32, limit: u32) -> Result<Url, url::ParseError> {
    let offset = search_offset(page, limit);
    Url::parse_with_params(
        &format!("{}/search.json", base.trim_end_matches('/')),
        &[
            ("q", query.to_string()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ],
    )
}

/// URL подробностей произведения.
pub fn work_url(base: &str, key: &str) -> String {
    format!("{}/works/{}.json", base.trim_end_matches('/'), works_id(key))
}

/// URL обложки среднего размера.
pub fn cover_url(covers_base: &str, cover_id: i64) -> String {
    format!("{}/b/id/{cover_id}-M.jpg", covers_base.trim_end_matches('/'))
}

/// Страница книги на сайте каталога.
pub fn open_library_url(base: &str, key: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        key.trim_start_matches('/')
    )
}

/// Идентификатор произведения без префикса `/works/`.
pub fn works_id(key: &str) -> &str {
    key.strip_prefix(WORKS_PREFIX).unwrap_or(key)
}

/// Подробности по ключу можно запросить только для произведений.
pub fn is_works_key(key: &str) -> bool {
    key.starts_with(WORKS_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details_with_subjects(count: usize) -> BookDetails {
        BookDetails {
            key: Some("/works/OL1W".to_string()),
            title: Some("t".to_string()),
            description: None,
            subjects: (0..count).map(|i| format!("s{i}")).collect(),
            covers: Vec::new(),
            first_publish_date: None,
        }
    }

    #[test]
    fn search_response_maps_docs_and_missing_fields() {
        let raw = r#"{
            "numFound": 30,
            "docs": [
                {"key": "/works/OL1W", "title": "Dune", "author_name": ["Frank Herbert"], "cover_i": 42, "first_publish_year": 1965, "language": ["eng", "fre"]},
                {"key": "/works/OL2W", "title": "Anon"}
            ]
        }"#;
        let response: SearchResponse = serde_json::from_str(raw).expect("valid json");
        let page = SearchPage::from_response(response, 2, 12, COVERS_URL);

        assert_eq!(page.total, 30);
        assert_eq!(page.books.len(), 2);
        let dune = &page.books[0];
        assert_eq!(
            dune.cover_url.as_deref(),
            Some("https://covers.openlibrary.org/b/id/42-M.jpg")
        );
        assert_eq!(dune.language.as_deref(), Some("eng"));
        assert_eq!(dune.primary_author(), "Frank Herbert");

        let anon = &page.books[1];
        assert!(anon.cover_url.is_none());
        assert_eq!(anon.primary_author(), UNKNOWN_AUTHOR);
        assert_eq!(anon.author_line(), UNKNOWN_AUTHOR);
    }

    #[test]
    fn description_accepts_plain_and_typed_forms() {
        let plain: WorkResponse =
            serde_json::from_str(r#"{"description": "plain text"}"#).expect("valid json");
        let typed: WorkResponse = serde_json::from_str(
            r#"{"description": {"type": "/type/text", "value": "typed text"}, "subjects": ["a"]}"#,
        )
        .expect("valid json");

        assert_eq!(
            BookDetails::from(plain).description.as_deref(),
            Some("plain text")
        );
        let typed = BookDetails::from(typed);
        assert_eq!(typed.description.as_deref(), Some("typed text"));
        assert_eq!(typed.subjects, vec!["a".to_string()]);
    }

    #[test]
    fn blank_description_is_treated_as_missing() {
        let work: WorkResponse =
            serde_json::from_str(r#"{"description": "   "}"#).expect("valid json");
        assert!(BookDetails::from(work).description.is_none());
    }

    #[test]
    fn pagination_flags_follow_total() {
        let page = |page, total| SearchPage {
            books: Vec::new(),
            total,
            page,
            limit: 12,
        };

        assert!(!page(1, 30).has_prev());
        assert!(page(1, 30).has_next());
        assert!(page(2, 30).has_next());
        assert!(!page(3, 30).has_next());
        assert!(!page(1, 12).has_next());
        assert_eq!(page(1, 30).total_pages(), 3);
        assert_eq!(page(1, 0).total_pages(), 1);
    }

    #[test]
    fn search_offset_starts_at_zero_for_first_page() {
        assert_eq!(search_offset(1, 12), 0);
        assert_eq!(search_offset(3, 12), 24);
        assert_eq!(search_offset(0, 12), 0);
    }

    #[test]
    fn search_url_encodes_query() {
        let url = search_url("https://openlibrary.org/", "the hobbit & co", 2, 12).expect("valid url");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert_eq!(url.path(), "/search.json");
        assert!(pairs.contains(&("q".to_string(), "the hobbit & co".to_string())));
        assert!(pairs.contains(&("offset".to_string(), "12".to_string())));
    }

    #[test]
    fn normalize_query_rejects_blank() {
        let err = normalize_query("   ").expect_err("blank query must fail");
        assert_eq!(err.field(), Some("query"));
        assert_eq!(normalize_query("  dune ").as_deref(), Ok("dune"));
    }

    #[test]
    fn work_url_strips_works_prefix() {
        assert_eq!(
            work_url(OPEN_LIBRARY_URL, "/works/OL45883W"),
            "https://openlibrary.org/works/OL45883W.json"
        );
        assert_eq!(
            work_url(OPEN_LIBRARY_URL, "OL45883W"),
            "https://openlibrary.org/works/OL45883W.json"
        );
        assert!(is_works_key("/works/OL45883W"));
        assert!(!is_works_key("/books/OL1M"));
    }

    #[test]
    fn open_library_url_joins_key() {
        assert_eq!(
            open_library_url(OPEN_LIBRARY_URL, "/works/OL1W"),
            "https://openlibrary.org/works/OL1W"
        );
    }

    #[test]
    fn subjects_collapse_to_preview() {
        let details = details_with_subjects(8);
        assert_eq!(details.visible_subjects(false).len(), SUBJECTS_PREVIEW);
        assert_eq!(details.hidden_subjects(false), 3);
        assert_eq!(details.visible_subjects(true).len(), 8);
        assert_eq!(details.hidden_subjects(true), 0);
        assert!(details.can_collapse(true));
        assert!(!details.can_collapse(false));

        let short = details_with_subjects(2);
        assert_eq!(short.visible_subjects(false).len(), 2);
        assert!(!short.can_collapse(true));
    }

    #[test]
    fn book_ref_joins_authors() {
        let book = BookSummary {
            id: "/works/OL1W".to_string(),
            title: "Good Omens".to_string(),
            authors: vec!["Terry Pratchett".to_string(), "Neil Gaiman".to_string()],
            cover_id: None,
            cover_url: None,
            first_publish_year: None,
            language: None,
        };
        let reference = BookRef::from(&book);
        assert_eq!(
            reference.author.as_deref(),
            Some("Terry Pratchett, Neil Gaiman")
        );
    }
}
