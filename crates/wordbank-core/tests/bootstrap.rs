
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wordbank_core::Route;

use fixtures::{context, mount_me, signed_in_context};

#[tokio::test]
async fn test_first_run_routes_to_onboarding() {
    let server = MockServer::start().await;
    let (ctx, _) = signed_in_context(&server, "t1", "r1").await;

    let route = ctx.bootstrap(true, &CancellationToken::new()).await.unwrap();
    assert_eq!(route, Route::Onboarding);
    assert!(!ctx.store().snapshot().auth.has_onboarded);
}

#[tokio::test]
async fn test_provider_signed_out_drops_local_session() {
    let server = MockServer::start().await;
    let (ctx, _) = signed_in_context(&server, "t1", "r1").await;
    ctx.set_has_onboarded(true).await.unwrap();

    let route = ctx.bootstrap(false, &CancellationToken::new()).await.unwrap();
    assert_eq!(route, Route::SignIn);
    assert!(ctx.tokens().get_access_token().await.unwrap().is_none());
    assert!(ctx.tokens().get_refresh_token().await.unwrap().is_none());
}

#[tokio::test]
async fn test_no_token_routes_to_sign_in() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let (ctx, _) = context(&server);
    ctx.set_has_onboarded(true).await.unwrap();

    let route = ctx.bootstrap(true, &CancellationToken::new()).await.unwrap();
    assert_eq!(route, Route::SignIn);
}

#[tokio::test]
async fn test_restored_session_routes_home() {
    let server = MockServer::start().await;
    mount_me(&server, "t1", "u1").await;
    let (ctx, _) = signed_in_context(&server, "t1", "r1").await;
    ctx.set_has_onboarded(true).await.unwrap();

    let route = ctx.bootstrap(true, &CancellationToken::new()).await.unwrap();
    assert_eq!(route, Route::Home);
    let state = ctx.store().snapshot();
    assert!(state.auth.has_onboarded);
    assert_eq!(state.auth.user().unwrap().id, "u1");
}

#[tokio::test]
async fn test_unreachable_backend_routes_to_sign_in() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let (ctx, _) = signed_in_context(&server, "t1", "r1").await;
    ctx.set_has_onboarded(true).await.unwrap();

    let route = ctx.bootstrap(true, &CancellationToken::new()).await.unwrap();
    assert_eq!(route, Route::SignIn);
    assert!(ctx.store().snapshot().auth.auth_error.is_some());
}
