use bookhub_core::auth::{
    OAuthProvider, PasswordGrant, RefreshGrant, SessionUser, SignUpRequest, SignUpResponse,
    TokenResponse, authorize_url,
};
use bookhub_core::book::{
    BookDetails, COVERS_URL, OPEN_LIBRARY_URL, SearchPage, SearchResponse, WorkResponse,
    normalize_query, search_url, work_url,
};
use bookhub_core::comment::{Comment, NewCommentRow};
use bookhub_core::listing::PostQuery;
use bookhub_core::post::{NewPostRow, Post, PostChanges, UpvoteChange};
use gloo_net::http::{Request, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

const SUPABASE_URL: &str = match option_env!("BOOKHUB_SUPABASE_URL") {
    Some(value) => value,
    None => "http://127.0.0.1:54321",
};

const SUPABASE_ANON_KEY: &str = match option_env!("BOOKHUB_SUPABASE_ANON_KEY") {
    Some(value) => value,
    None => "",
};

#[derive(Debug, Clone)]
pub(crate) enum ApiError {
    Network(String),
    Http { status: u16, message: String },
    Decode(String),
}

impl ApiError {
    /// HTTP-статус ответа; `None`, если ответа не было.
    pub(crate) fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network(_) | Self::Decode(_) => None,
        }
    }
}

impl core::fmt::Display for ApiError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Http { message, .. } => write!(f, "{message}"),
            Self::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl From<bookhub_core::DomainError> for ApiError {
    fn from(err: bookhub_core::DomainError) -> Self {
        Self::Http {
            status: 400,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

fn endpoint(path: &str) -> String {
    format!(
        "{}/{}",
        SUPABASE_URL.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn eq(value: impl core::fmt::Display) -> String {
    format!("eq.{value}")
}

/// Ключ проекта и токен: пользователя, если он вошёл, иначе anon-ключ.
fn with_keys(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    builder
        .header("apikey", SUPABASE_ANON_KEY)
        .header(
            "Authorization",
            &format!("Bearer {}", token.unwrap_or(SUPABASE_ANON_KEY)),
        )
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response
        .json::<T>()
        .await
        .map_err(|err| ApiError::Decode(err.to_string()))
}

async fn parse_error_body(response: Response) -> ApiError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    let fallback = match status {
        400 => "Invalid request".to_string(),
        401 => "Please sign in again".to_string(),
        403 => "You don't have permission to do that".to_string(),
        404 => "Not found".to_string(),
        409 => "This record already exists".to_string(),
        422 => "The request could not be processed".to_string(),
        500..=599 => "Server error, please try again later".to_string(),
        _ => format!("HTTP error {status}"),
    };

    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| {
            body.error_description
                .or(body.msg)
                .or(body.message)
                .or(body.error)
        })
        .filter(|message| !message.trim().is_empty())
        .unwrap_or(fallback);

    ApiError::Http { status, message }
}

async fn check(response: Response) -> Result<Response, ApiError> {
    if !response.ok() {
        return Err(parse_error_body(response).await);
    }
    Ok(response)
}

async fn send(builder: RequestBuilder) -> Result<Response, ApiError> {
    let response = builder
        .send()
        .await
        .map_err(|err| ApiError::Network(err.to_string()))?;
    check(response).await
}

async fn send_request(request: Result<Request, gloo_net::Error>) -> Result<Response, ApiError> {
    let response = request
        .map_err(|err| ApiError::Network(err.to_string()))?
        .send()
        .await
        .map_err(|err| ApiError::Network(err.to_string()))?;
    check(response).await
}

fn first_row<T>(rows: Vec<T>, what: &str) -> Result<T, ApiError> {
    rows.into_iter().next().ok_or_else(|| ApiError::Http {
        status: 404,
        message: format!("{what} not found"),
    })
}

pub(crate) async fn sign_up(payload: &SignUpRequest) -> Result<SignUpResponse, ApiError> {
    let builder = Request::post(&endpoint("/auth/v1/signup")).header("apikey", SUPABASE_ANON_KEY);
    parse_json(send_request(builder.json(payload)).await?).await
}

pub(crate) async fn sign_in(grant: &PasswordGrant) -> Result<TokenResponse, ApiError> {
    let builder = Request::post(&endpoint("/auth/v1/token"))
        .query([("grant_type", "password")])
        .header("apikey", SUPABASE_ANON_KEY);
    parse_json(send_request(builder.json(grant)).await?).await
}

pub(crate) async fn refresh(refresh_token: &str) -> Result<TokenResponse, ApiError> {
    let grant = RefreshGrant {
        refresh_token: refresh_token.to_string(),
    };
    let builder = Request::post(&endpoint("/auth/v1/token"))
        .query([("grant_type", "refresh_token")])
        .header("apikey", SUPABASE_ANON_KEY);
    parse_json(send_request(builder.json(&grant)).await?).await
}

pub(crate) async fn sign_out(access_token: &str) -> Result<(), ApiError> {
    send(with_keys(
        Request::post(&endpoint("/auth/v1/logout")),
        Some(access_token),
    ))
    .await?;
    Ok(())
}

pub(crate) async fn get_user(access_token: &str) -> Result<SessionUser, ApiError> {
    let builder = with_keys(Request::get(&endpoint("/auth/v1/user")), Some(access_token));
    parse_json(send(builder).await?).await
}

/// Провайдер возвращает пользователя на текущую страницу.
pub(crate) fn oauth_url(provider: OAuthProvider, redirect_to: &str) -> Result<String, ApiError> {
    authorize_url(SUPABASE_URL, provider, Some(redirect_to))
        .map(String::from)
        .map_err(|err| ApiError::Decode(err.to_string()))
}

fn posts() -> String {
    endpoint("/rest/v1/posts")
}

fn comments() -> String {
    endpoint("/rest/v1/comments")
}

pub(crate) async fn list_posts(query: &PostQuery) -> Result<Vec<Post>, ApiError> {
    let mut params = vec![("select", "*".to_string()), ("order", query.order_param())];
    if let Some(filter) = query.title_filter() {
        params.push(("title", filter));
    }
    let builder = with_keys(Request::get(&posts()), None).query(params);
    parse_json(send(builder).await?).await
}

pub(crate) async fn posts_by_user(user_id: &str) -> Result<Vec<Post>, ApiError> {
    let builder = with_keys(Request::get(&posts()), None).query([
        ("select", "*".to_string()),
        ("user_id", eq(user_id)),
        ("order", "created_at.desc".to_string()),
    ]);
    parse_json(send(builder).await?).await
}

pub(crate) async fn get_post(id: Uuid) -> Result<Post, ApiError> {
    let builder = with_keys(Request::get(&posts()), None)
        .query([("select", "*".to_string()), ("id", eq(id))]);
    first_row(parse_json(send(builder).await?).await?, "Post")
}

pub(crate) async fn create_post(token: &str, row: &NewPostRow) -> Result<Post, ApiError> {
    let builder = with_keys(Request::post(&posts()), Some(token))
        .header("Prefer", "return=representation");
    first_row(parse_json(send_request(builder.json(row)).await?).await?, "Post")
}

pub(crate) async fn update_post(token: &str, id: Uuid, changes: &PostChanges) -> Result<Post, ApiError> {
    let builder = with_keys(Request::patch(&posts()), Some(token))
        .query([("id", eq(id))])
        .header("Prefer", "return=representation");
    first_row(parse_json(send_request(builder.json(changes)).await?).await?, "Post")
}

pub(crate) async fn set_upvotes(token: &str, id: Uuid, change: UpvoteChange) -> Result<Post, ApiError> {
    let builder = with_keys(Request::patch(&posts()), Some(token))
        .query([("id", eq(id))])
        .header("Prefer", "return=representation");
    first_row(parse_json(send_request(builder.json(&change)).await?).await?, "Post")
}

/// Сначала удаляются комментарии поста, затем сам пост.
pub(crate) async fn delete_post(token: &str, id: Uuid) -> Result<(), ApiError> {
    send(with_keys(Request::delete(&comments()), Some(token)).query([("post_id", eq(id))])).await?;
    send(with_keys(Request::delete(&posts()), Some(token)).query([("id", eq(id))])).await?;
    Ok(())
}

pub(crate) async fn list_comments(post_id: Uuid) -> Result<Vec<Comment>, ApiError> {
    let builder = with_keys(Request::get(&comments()), None).query([
        ("select", "*".to_string()),
        ("post_id", eq(post_id)),
        ("order", "created_at.desc".to_string()),
    ]);
    parse_json(send(builder).await?).await
}

pub(crate) async fn add_comment(token: &str, row: &NewCommentRow) -> Result<Comment, ApiError> {
    let builder = with_keys(Request::post(&comments()), Some(token))
        .header("Prefer", "return=representation");
    first_row(parse_json(send_request(builder.json(row)).await?).await?, "Comment")
}

pub(crate) async fn delete_comment(token: &str, id: Uuid) -> Result<(), ApiError> {
    send(with_keys(Request::delete(&comments()), Some(token)).query([("id", eq(id))])).await?;
    Ok(())
}

pub(crate) async fn search_books(query: &str, page: u32, limit: u32) -> Result<SearchPage, ApiError> {
    let query = normalize_query(query)?;
    let url = search_url(OPEN_LIBRARY_URL, &query, page, limit)
        .map_err(|err| ApiError::Decode(err.to_string()))?;
    let response: SearchResponse = parse_json(send(Request::get(url.as_str())).await?).await?;
    Ok(SearchPage::from_response(response, page, limit, COVERS_URL))
}

pub(crate) async fn work_details(key: &str) -> Result<BookDetails, ApiError> {
    let response: WorkResponse =
        parse_json(send(Request::get(&work_url(OPEN_LIBRARY_URL, key))).await?).await?;
    Ok(response.into())
}
