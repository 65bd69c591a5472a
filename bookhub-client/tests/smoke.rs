use std::time::{SystemTime, UNIX_EPOCH};

use bookhub_client::{
    BookhubClient, BookhubClientError, CommentDraft, DomainError, PostDraft, PostPatch,
    PostQuery, Settings, SignInForm,
};

fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock must be after unix epoch")
        .as_nanos();
    format!("{nanos}")
}

#[tokio::test]
#[ignore = "requires a live backend project and a confirmed test account"]
async fn backend_smoke_flow() {
    let settings = Settings::from_env().expect("SUPABASE_URL and SUPABASE_ANON_KEY must be set");
    let email = std::env::var("BOOKHUB_TEST_EMAIL").expect("BOOKHUB_TEST_EMAIL must be set");
    let password =
        std::env::var("BOOKHUB_TEST_PASSWORD").expect("BOOKHUB_TEST_PASSWORD must be set");
    let mut client = BookhubClient::new(settings).expect("client must build");

    let user = client
        .sign_in(SignInForm { email, password })
        .await
        .expect("sign_in must succeed");
    assert!(client.session().is_some());

    let title = format!("smoke post {}", unique_suffix());
    let created = client
        .create_post(PostDraft {
            title: title.clone(),
            content: "smoke content".to_string(),
            ..PostDraft::default()
        })
        .await
        .expect("create_post must succeed");
    assert_eq!(created.title, title);
    assert_eq!(created.upvote_count(), 0);
    assert!(created.is_authored_by(&user.id));

    let listed = client
        .list_posts(&PostQuery {
            search: title.clone(),
            ..PostQuery::default()
        })
        .await
        .expect("list_posts must succeed");
    assert!(listed.iter().any(|post| post.id == created.id));

    let upvoted = client.upvote(created.id).await.expect("upvote must succeed");
    assert_eq!(upvoted.upvote_count(), 1);

    let updated = client
        .update_post(
            created.id,
            PostPatch {
                title: format!("{title} updated"),
                content: "smoke content updated".to_string(),
                ..PostPatch::default()
            },
        )
        .await
        .expect("update_post must succeed");
    assert_eq!(updated.title, format!("{title} updated"));

    client
        .add_comment(CommentDraft {
            post_id: created.id,
            content: "smoke comment".to_string(),
        })
        .await
        .expect("add_comment must succeed");
    let detail = client
        .post_detail(created.id)
        .await
        .expect("post_detail must succeed");
    assert_eq!(detail.comments.len(), 1);

    client
        .delete_post(created.id)
        .await
        .expect("delete_post must succeed");

    let after_delete = client.get_post(created.id).await;
    assert!(matches!(
        after_delete,
        Err(BookhubClientError::Domain(DomainError::NotFound(_)))
    ));

    client.sign_out().await;
    assert!(client.session().is_none());
}

#[tokio::test]
#[ignore = "requires network access to the Open Library catalog"]
async fn catalog_smoke_flow() {
    let client = BookhubClient::new(Settings::new("http://127.0.0.1:9", "anon"))
        .expect("client must build");

    let page = client
        .search_books("the hobbit", 1, 10)
        .await
        .expect("search must succeed");
    assert!(page.total > 0);
    assert!(!page.books.is_empty());

    let work = page
        .books
        .iter()
        .find(|book| book.id.starts_with("/works/"))
        .expect("catalog must return works");
    let details = client
        .book_details(&work.id)
        .await
        .expect("book_details must succeed");
    assert!(details.title.is_some());
}
