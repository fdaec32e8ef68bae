#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};

use postboard::repositories::Repository;

use common::{body_text, location, post_cards, TestContext};

#[actix_web::test]
async fn user_can_follow_and_unfollow() {
    let ctx = TestContext::new();
    let reader = ctx.user("reader").await;
    let author = ctx.user("author").await;
    let app = test_app!(ctx);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/profile/author/follow/")
            .cookie(ctx.cookie_for(&reader))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/author/");
    assert!(ctx.repo.is_following(reader.id, author.id).await.unwrap());
    assert_eq!(ctx.repo.count_followers(author.id).await.unwrap(), 1);

    // following twice does not add a second edge
    test::call_service(
        &app,
        TestRequest::get()
            .uri("/profile/author/follow/")
            .cookie(ctx.cookie_for(&reader))
            .to_request(),
    )
    .await;
    assert_eq!(ctx.repo.count_followers(author.id).await.unwrap(), 1);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/profile/author/unfollow/")
            .cookie(ctx.cookie_for(&reader))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(!ctx.repo.is_following(reader.id, author.id).await.unwrap());
    assert_eq!(ctx.repo.count_followers(author.id).await.unwrap(), 0);
}

#[actix_web::test]
async fn user_cannot_follow_themselves() {
    let ctx = TestContext::new();
    let author = ctx.user("author").await;
    let app = test_app!(ctx);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/profile/author/follow/")
            .cookie(ctx.cookie_for(&author))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(ctx.repo.count_following(author.id).await.unwrap(), 0);
}

#[actix_web::test]
async fn following_an_unknown_user_is_404() {
    let ctx = TestContext::new();
    let reader = ctx.user("reader").await;
    let app = test_app!(ctx);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/profile/nobody/follow/")
            .cookie(ctx.cookie_for(&reader))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn guest_cannot_follow() {
    let ctx = TestContext::new();
    let author = ctx.user("author").await;
    let app = test_app!(ctx);

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/profile/author/follow/").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("/auth/login/"));
    assert_eq!(ctx.repo.count_followers(author.id).await.unwrap(), 0);
}

#[actix_web::test]
async fn feed_contains_only_followed_authors() {
    let ctx = TestContext::new();
    let reader = ctx.user("reader").await;
    let stranger = ctx.user("stranger").await;
    let author = ctx.user("author").await;
    ctx.post(&author, "Followed author post", None).await;
    ctx.post(&stranger, "Stranger post", None).await;
    ctx.repo_follow(&reader, &author).await;
    let app = test_app!(ctx);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/follow/")
            .cookie(ctx.cookie_for(&reader))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert_eq!(post_cards(&html), 1);
    assert!(html.contains("Followed author post"));
    assert!(!html.contains("Stranger post"));

    // the stranger follows nobody, so their feed is empty
    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/follow/")
            .cookie(ctx.cookie_for(&stranger))
            .to_request(),
    )
    .await;
    assert_eq!(post_cards(&body_text(resp).await), 0);
}

#[actix_web::test]
async fn profile_shows_follow_link_to_other_users() {
    let ctx = TestContext::new();
    let reader = ctx.user("reader").await;
    ctx.user("author").await;
    let app = test_app!(ctx);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/profile/author/")
            .cookie(ctx.cookie_for(&reader))
            .to_request(),
    )
    .await;
    assert!(body_text(resp).await.contains("/profile/author/follow/"));

    let own = test::call_service(
        &app,
        TestRequest::get()
            .uri("/profile/reader/")
            .cookie(ctx.cookie_for(&reader))
            .to_request(),
    )
    .await;
    assert!(!body_text(own).await.contains("class=\"btn follow\""));
}
