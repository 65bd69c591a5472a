mod logging;
mod output;
mod session_file;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use bookhub_client::{
    BookRef, BookhubClient, BookhubClientError, CommentDraft, DomainError, OAuthProvider,
    PostDraft, PostPatch, PostQuery, Settings, SignInForm, SignUpForm, SignUpOutcome, SortKey,
};
use bookhub_core::book::{EXPLORER_PAGE_SIZE, cover_url};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::session_file::SESSION_FILE;

#[derive(Debug, Parser)]
#[command(name = "bookhub", version, about = "CLI клиент BookHub")]
struct Cli {
    /// Файл, в котором хранится сессия между запусками.
    #[arg(long, global = true, default_value = SESSION_FILE)]
    session_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Регистрация пользователя.
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        #[arg(long)]
        username: String,
    },
    /// Вход по email и паролю.
    Signin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// URL входа через OAuth-провайдера.
    OauthUrl {
        #[arg(long)]
        provider: OAuthProvider,
        #[arg(long)]
        redirect_to: Option<String>,
    },
    /// Завершение OAuth-входа по URL, на который вернул провайдер.
    OauthCallback {
        #[arg(long)]
        url: String,
    },
    /// Выход.
    Signout,
    /// Текущий пользователь.
    Whoami,
    /// Профиль: пользователь и его посты.
    Profile,
    /// Посты.
    Posts {
        #[command(subcommand)]
        command: PostsCommand,
    },
    /// Комментарии.
    Comments {
        #[command(subcommand)]
        command: CommentsCommand,
    },
    /// Каталог книг.
    Books {
        #[command(subcommand)]
        command: BooksCommand,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Date,
    Upvotes,
}

impl From<SortArg> for SortKey {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Date => SortKey::CreatedAt,
            SortArg::Upvotes => SortKey::Upvotes,
        }
    }
}

#[derive(Debug, Args)]
struct BookArgs {
    /// Ключ произведения в каталоге (`/works/OL...W`).
    #[arg(long)]
    book: Option<String>,
    /// Авторы книги.
    #[arg(long, requires = "book")]
    book_author: Option<String>,
}

#[derive(Debug, Subcommand)]
enum PostsCommand {
    /// Лента постов.
    List {
        #[arg(long, value_enum, default_value_t = SortArg::Date)]
        sort: SortArg,
        /// По возрастанию (по умолчанию по убыванию).
        #[arg(long)]
        asc: bool,
        /// Поиск по заголовку.
        #[arg(long)]
        search: Option<String>,
    },
    /// Пост с комментариями.
    Show { id: Uuid },
    /// Создание поста (требует входа).
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
        #[command(flatten)]
        book: BookArgs,
    },
    /// Редактирование своего поста.
    ///
    /// Не указанные поля остаются прежними.
    Edit {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
        #[command(flatten)]
        book: BookArgs,
        /// Отвязать книгу.
        #[arg(long, conflicts_with = "book")]
        remove_book: bool,
    },
    /// Удаление своего поста вместе с комментариями.
    Delete { id: Uuid },
    /// Голос за пост.
    Upvote { id: Uuid },
}

#[derive(Debug, Subcommand)]
enum CommentsCommand {
    /// Новый комментарий.
    Add {
        #[arg(long)]
        post: Uuid,
        #[arg(long)]
        content: String,
    },
    /// Удаление своего комментария.
    Delete { id: Uuid },
}

#[derive(Debug, Subcommand)]
enum BooksCommand {
    /// Поиск книг.
    Search {
        query: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = EXPLORER_PAGE_SIZE)]
        limit: u32,
    },
    /// Подробности произведения.
    Show { key: String },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Ошибка: {err}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = Settings::from_env()?;
    logging::init_logging(&settings.log_level)?;

    let mut client = BookhubClient::new(settings).map_err(map_client_error)?;
    restore_session(&mut client, &cli.session_file).await;

    match cli.command {
        Command::Signup {
            email,
            password,
            confirm_password,
            username,
        } => {
            let form = SignUpForm {
                email,
                password,
                confirm_password,
                username,
            };
            match client.sign_up(form).await.map_err(map_client_error)? {
                SignUpOutcome::SignedIn(user) => {
                    persist_session(&client, &cli.session_file)?;
                    output::print_user("Регистрация успешна", &user);
                }
                SignUpOutcome::ConfirmationRequired { email } => {
                    println!("{}", confirmation_message(&email));
                }
            }
        }
        Command::Signin { email, password } => {
            let user = client
                .sign_in(SignInForm { email, password })
                .await
                .map_err(map_client_error)?;
            persist_session(&client, &cli.session_file)?;
            output::print_user("Вход выполнен", &user);
        }
        Command::OauthUrl {
            provider,
            redirect_to,
        } => {
            let url = client
                .oauth_url(provider, redirect_to.as_deref())
                .map_err(map_client_error)?;
            println!("{url}");
        }
        Command::OauthCallback { url } => {
            let user = client
                .complete_oauth(&url)
                .await
                .map_err(map_client_error)?;
            persist_session(&client, &cli.session_file)?;
            output::print_user("Вход выполнен", &user);
        }
        Command::Signout => {
            client.sign_out().await;
            session_file::remove(&cli.session_file).context("не удалось удалить файл сессии")?;
            println!("Выход выполнен");
        }
        Command::Whoami => {
            if client.session().is_none() {
                println!("Вход не выполнен");
                return Ok(());
            }
            let user = client.fetch_user().await.map_err(map_client_error)?;
            persist_session(&client, &cli.session_file)?;
            output::print_user("Пользователь", &user);
        }
        Command::Profile => {
            let posts = client.my_posts().await.map_err(map_client_error)?;
            if let Some(user) = client.current_user() {
                output::print_user("Профиль", user);
            }
            output::print_posts("Мои посты", &posts);
        }
        Command::Posts { command } => run_posts(&client, command).await?,
        Command::Comments { command } => run_comments(&client, command).await?,
        Command::Books { command } => run_books(&client, command).await?,
    }

    Ok(())
}

/// Подхватывает сохранённую сессию и обновляет её, если токен скоро истечёт.
/// Восстанавливает сохранённую сессию. Сбой обновления токена не прерывает
/// команду: `signin`, `signout` и `books` работают и без действующей сессии.
async fn restore_session(client: &mut BookhubClient, path: &Path) {
    let session = match session_file::load(path) {
        Ok(Some(session)) => session,
        Ok(None) => return,
        Err(err) => {
            warn!(error = %err, path = %path.display(), "session file is unreadable, ignoring it");
            return;
        }
    };
    client.set_session(session);

    match client.refresh_if_needed().await {
        Ok(true) => {
            debug!("session refreshed");
            if let Err(err) = persist_session(client, path) {
                warn!(error = %err, "failed to store refreshed session");
            }
        }
        Ok(false) => {}
        Err(err) if client.session().is_none() => {
            warn!(error = %err, "stored session was rejected, sign in again");
            if let Err(err) = session_file::remove(path) {
                warn!(error = %err, "failed to remove session file");
            }
        }
        Err(err) => warn!(error = %err, "session refresh failed, keeping stored session"),
    }
}

fn persist_session(client: &BookhubClient, path: &Path) -> Result<()> {
    if let Some(session) = client.session() {
        session_file::save(path, session).context("не удалось сохранить сессию")?;
    }
    Ok(())
}

async fn run_posts(client: &BookhubClient, command: PostsCommand) -> Result<()> {
    match command {
        PostsCommand::List { sort, asc, search } => {
            let query = PostQuery {
                sort: sort.into(),
                ascending: asc,
                search: search.unwrap_or_default(),
            };
            let posts = client.list_posts(&query).await.map_err(map_client_error)?;
            output::print_posts("Постов", &posts);
        }
        PostsCommand::Show { id } => {
            let detail = client.post_detail(id).await.map_err(map_client_error)?;
            output::print_detail(&detail, &client.settings().open_library_url);
        }
        PostsCommand::Create {
            title,
            content,
            image_url,
            book,
        } => {
            let mut draft = PostDraft {
                title,
                content: content.unwrap_or_default(),
                image_url,
                ..PostDraft::default()
            };
            if let Some(attached) = resolve_book(client, book).await? {
                draft.book = Some(attached.book);
                if attached.cover_url.is_some() {
                    draft.image_url = attached.cover_url;
                }
            }
            let post = client.create_post(draft).await.map_err(map_client_error)?;
            output::print_post("Пост создан", &post);
        }
        PostsCommand::Edit {
            id,
            title,
            content,
            image_url,
            book,
            remove_book,
        } => {
            let current = client.get_post(id).await.map_err(map_client_error)?;
            let mut patch = PostPatch::from(&current);
            if let Some(title) = title {
                patch.title = title;
            }
            if let Some(content) = content {
                patch.content = content;
            }
            if image_url.is_some() {
                patch.image_url = image_url;
            }
            if remove_book {
                patch.book = None;
            } else if let Some(attached) = resolve_book(client, book).await? {
                patch.book = Some(attached.book);
                if attached.cover_url.is_some() {
                    patch.image_url = attached.cover_url;
                }
            }
            let post = client
                .update_post(id, patch)
                .await
                .map_err(map_client_error)?;
            output::print_post("Пост обновлён", &post);
        }
        PostsCommand::Delete { id } => {
            client.delete_post(id).await.map_err(map_client_error)?;
            println!("Пост удалён: id={id}");
        }
        PostsCommand::Upvote { id } => {
            let post = client.upvote(id).await.map_err(map_client_error)?;
            println!("Голос учтён: {} (upvotes={})", post.title, post.upvote_count());
        }
    }
    Ok(())
}

async fn run_comments(client: &BookhubClient, command: CommentsCommand) -> Result<()> {
    match command {
        CommentsCommand::Add { post, content } => {
            let comment = client
                .add_comment(CommentDraft {
                    post_id: post,
                    content,
                })
                .await
                .map_err(map_client_error)?;
            println!("Комментарий добавлен: id={}", comment.id);
        }
        CommentsCommand::Delete { id } => {
            client.delete_comment(id).await.map_err(map_client_error)?;
            println!("Комментарий удалён: id={id}");
        }
    }
    Ok(())
}

async fn run_books(client: &BookhubClient, command: BooksCommand) -> Result<()> {
    match command {
        BooksCommand::Search { query, page, limit } => {
            let page = client
                .search_books(&query, page, limit)
                .await
                .map_err(map_client_error)?;
            output::print_search(&page);
        }
        BooksCommand::Show { key } => {
            let details = client.book_details(&key).await.map_err(map_client_error)?;
            output::print_book(&details, &client.settings().open_library_url);
        }
    }
    Ok(())
}

struct AttachedBook {
    book: BookRef,
    cover_url: Option<String>,
}

/// Книга для привязки к посту: название и обложка берутся из каталога.
async fn resolve_book(client: &BookhubClient, args: BookArgs) -> Result<Option<AttachedBook>> {
    let Some(key) = args.book else {
        return Ok(None);
    };
    let details = client.book_details(&key).await.map_err(map_client_error)?;
    let cover_url = details
        .covers
        .first()
        .map(|id| cover_url(&client.settings().covers_url, *id));

    Ok(Some(AttachedBook {
        book: BookRef {
            api_id: details.key.unwrap_or(key.clone()),
            title: details.title.unwrap_or(key),
            author: args.book_author,
        },
        cover_url,
    }))
}

fn confirmation_message(email: &str) -> String {
    format!("Регистрация почти завершена: подтвердите email по ссылке из письма ({email})")
}

fn map_client_error(err: BookhubClientError) -> anyhow::Error {
    let message = match &err {
        BookhubClientError::Unauthorized | BookhubClientError::Domain(DomainError::Unauthorized(_)) => {
            format!(
                "{}: выполните `bookhub signin ...` или `bookhub signup ...`",
                err.user_message()
            )
        }
        BookhubClientError::Domain(DomainError::Validation { field, message }) => {
            format!("{field}: {message}")
        }
        _ => err.user_message(),
    };
    anyhow::anyhow!(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posts_list_parses_sort_and_direction() {
        let cli = Cli::try_parse_from([
            "bookhub", "posts", "list", "--sort", "upvotes", "--asc", "--search", "dune",
        ])
        .expect("valid args");

        match cli.command {
            Command::Posts {
                command: PostsCommand::List { sort, asc, search },
            } => {
                assert_eq!(SortKey::from(sort), SortKey::Upvotes);
                assert!(asc);
                assert_eq!(search.as_deref(), Some("dune"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.session_file, PathBuf::from(SESSION_FILE));
    }

    #[test]
    fn oauth_url_parses_provider() {
        let cli = Cli::try_parse_from(["bookhub", "oauth-url", "--provider", "github"])
            .expect("valid args");
        match cli.command {
            Command::OauthUrl { provider, .. } => assert_eq!(provider, OAuthProvider::Github),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(Cli::try_parse_from(["bookhub", "oauth-url", "--provider", "myspace"]).is_err());
    }

    #[test]
    fn book_author_requires_book() {
        let result = Cli::try_parse_from([
            "bookhub",
            "posts",
            "create",
            "--title",
            "Dune",
            "--book-author",
            "Frank Herbert",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn remove_book_conflicts_with_book() {
        let id = Uuid::new_v4().to_string();
        let result = Cli::try_parse_from([
            "bookhub",
            "posts",
            "edit",
            id.as_str(),
            "--book",
            "/works/OL1W",
            "--remove-book",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn session_file_flag_is_global() {
        let cli = Cli::try_parse_from(["bookhub", "whoami", "--session-file", "/tmp/s.json"])
            .expect("valid args");
        assert_eq!(cli.session_file, PathBuf::from("/tmp/s.json"));
    }

    #[test]
    fn unauthorized_error_suggests_signin() {
        let err = map_client_error(BookhubClientError::Unauthorized);
        assert!(err.to_string().contains("bookhub signin"));
    }

    #[test]
    fn validation_error_names_field() {
        let err = map_client_error(BookhubClientError::Domain(DomainError::Validation {
            field: "title",
            message: "Post title is required",
        }));
        assert_eq!(err.to_string(), "title: Post title is required");
    }

    #[test]
    fn confirmation_message_names_email() {
        let message = confirmation_message("reader@example.com");
        assert!(message.starts_with("Регистрация почти завершена"));
        assert!(message.contains("reader@example.com"));
    }

    fn temp_session_file() -> PathBuf {
        std::env::temp_dir().join(format!("bookhub-cli-{}.json", Uuid::new_v4()))
    }

    fn expiring_session() -> bookhub_client::Session {
        bookhub_client::Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Some(chrono::Utc::now()),
            user: bookhub_client::SessionUser {
                id: "user-1".to_string(),
                email: Some("reader@example.com".to_string()),
                user_metadata: Default::default(),
            },
        }
    }

    #[tokio::test]
    async fn unreachable_backend_keeps_stored_session() {
        let path = temp_session_file();
        session_file::save(&path, &expiring_session()).expect("save must succeed");
        let mut client = BookhubClient::new(Settings::new("http://127.0.0.1:9", "anon"))
            .expect("client must build");

        restore_session(&mut client, &path).await;

        assert_eq!(client.session().map(|s| s.refresh_token.as_str()), Some("refresh"));
        assert!(path.exists());
        session_file::remove(&path).expect("cleanup");
    }

    #[tokio::test]
    async fn rejected_refresh_removes_session_file() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/auth/v1/token"))
            .respond_with(wiremock::ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Invalid Refresh Token"
            })))
            .mount(&server)
            .await;

        let path = temp_session_file();
        session_file::save(&path, &expiring_session()).expect("save must succeed");
        let mut client =
            BookhubClient::new(Settings::new(server.uri(), "anon")).expect("client must build");

        restore_session(&mut client, &path).await;

        assert!(client.session().is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn corrupt_session_file_is_ignored() {
        let path = temp_session_file();
        std::fs::write(&path, "not json").expect("write must succeed");
        let mut client = BookhubClient::new(Settings::new("http://127.0.0.1:9", "anon"))
            .expect("client must build");

        restore_session(&mut client, &path).await;

        assert!(client.session().is_none());
        session_file::remove(&path).expect("cleanup");
    }
}
