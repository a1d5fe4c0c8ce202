mod common;

use axum::{Router, routing::get};
use axum_test::TestServer;
use safe_shortener::api::handlers::redirect_handler;
use safe_shortener::domain::entities::{BlockState, ReachableState, RedirectMode};
use safe_shortener::domain::repositories::ShortUrlRepository;

fn server(app: &common::TestApp) -> TestServer {
    let router = Router::new()
        .route("/{hash}", get(redirect_handler))
        .layer(common::MockConnectInfoLayer)
        .with_state(app.state.clone());

    TestServer::new(router).unwrap()
}

#[tokio::test]
async fn test_redirect_success() {
    let app = common::create_test_app(common::Checks::default()).await;
    common::create_test_short_url(&app.short_urls, "redirect1", "https://example.com/target").await;
    let server = server(&app);

    let response = server.get("/redirect1").await;

    assert_eq!(response.status_code(), 307);
    assert_eq!(response.header("location"), "https://example.com/target");
}

#[tokio::test]
async fn test_redirect_not_found() {
    let app = common::create_test_app(common::Checks::default()).await;
    let server = server(&app);

    let response = server.get("/notfound").await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_redirect_blocked_is_forbidden() {
    let app = common::create_test_app(common::Checks::default()).await;
    common::create_test_short_url(&app.short_urls, "blocked", "https://evil.example/").await;
    app.short_urls
        .update_redirect_mode("blocked", RedirectMode::FORBIDDEN)
        .await
        .unwrap();
    app.short_urls
        .update_block_state("blocked", BlockState::FailBlockUrl)
        .await
        .unwrap();
    let server = server(&app);

    let response = server.get("/blocked").await;

    assert_eq!(response.status_code(), 403);
    assert!(response.headers().get("location").is_none());
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "forbidden");
    assert_eq!(json["error"]["details"]["validation"], "BLOCKED_URL");
}

#[tokio::test]
async fn test_redirect_unreachable_is_bad_request() {
    let app = common::create_test_app(common::Checks::default()).await;
    common::create_test_short_url(&app.short_urls, "down", "https://down.example/").await;
    app.short_urls
        .update_redirect_mode("down", RedirectMode::BAD_REQUEST)
        .await
        .unwrap();
    app.short_urls
        .update_reachable_state("down", ReachableState::FailNotReachable)
        .await
        .unwrap();
    let server = server(&app);

    let response = server.get("/down").await;

    response.assert_status_bad_request();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["message"], "Destination URL is not reachable");
}

#[tokio::test]
async fn test_redirect_unsafe_is_forbidden() {
    let app = common::create_test_app(common::Checks::default()).await;
    common::create_test_short_url(&app.short_urls, "unsafe", "https://malware.example/").await;
    app.short_urls
        .update_redirect_mode("unsafe", RedirectMode::FORBIDDEN)
        .await
        .unwrap();
    app.short_urls.update_safe("unsafe", false).await.unwrap();
    let server = server(&app);

    let response = server.get("/unsafe").await;

    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_redirect_records_click() {
    let mut app = common::create_test_app(common::Checks::default()).await;
    common::create_test_short_url(&app.short_urls, "clickme", "https://example.com").await;
    let server = server(&app);

    let response = server
        .get("/clickme")
        .add_header("User-Agent", "TestBot/1.0")
        .add_header("Referer", "https://google.com")
        .await;

    assert_eq!(response.status_code(), 307);

    let event = app.click_rx.try_recv().unwrap();
    assert_eq!(event.hash, "clickme");
    assert_eq!(event.ip.as_deref(), Some("127.0.0.1"));
    assert_eq!(event.user_agent.as_deref(), Some("TestBot/1.0"));
    assert_eq!(event.referrer.as_deref(), Some("https://google.com"));
}

#[tokio::test]
async fn test_rejected_redirect_records_no_click() {
    let mut app = common::create_test_app(common::Checks::default()).await;
    common::create_test_short_url(&app.short_urls, "noclick", "https://evil.example/").await;
    app.short_urls
        .update_redirect_mode("noclick", RedirectMode::FORBIDDEN)
        .await
        .unwrap();
    let server = server(&app);

    let response = server.get("/noclick").await;
    assert_eq!(response.status_code(), 403);

    assert!(app.click_rx.try_recv().is_err());
}
