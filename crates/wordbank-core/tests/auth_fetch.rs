//! Authenticated fetch: bearer headers, refresh-and-retry, single-flight.


use std::time::Duration;

use futures_util::future::join_all;
use serde_json::json;
use wiremock::matchers::{bearer_token, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wordbank_core::api::{ApiError, ApiRequest, endpoints};

use fixtures::{context, mount_me, signed_in_context, unauthorized};

async fn mount_refresh(server: &MockServer, refresh: &str, fresh: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/users/refresh-token"))
        .and(body_json(json!({ "refresh_token": refresh })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": fresh })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_me_unauthorized(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(bearer_token(token))
        .respond_with(unauthorized())
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_refresh_then_retry_once() {
    let server = MockServer::start().await;
    mount_me_unauthorized(&server, "t1").await;
    mount_refresh(&server, "r1", "t2", 1).await;
    mount_me(&server, "t2", "u1").await;

    let (ctx, _) = signed_in_context(&server, "t1", "r1").await;
    let response = ctx
        .api()
        .auth_fetch(&ApiRequest::get(endpoints::ME))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        ctx.tokens().get_access_token().await.unwrap().as_deref(),
        Some("t2")
    );
    assert_eq!(
        ctx.tokens().get_refresh_token().await.unwrap().as_deref(),
        Some("r1")
    );
}

#[tokio::test]
async fn test_second_401_burns_tokens_without_refreshing_again() {
    let server = MockServer::start().await;
    mount_me_unauthorized(&server, "t1").await;
    mount_refresh(&server, "r1", "t2", 1).await;
    mount_me_unauthorized(&server, "t2").await;

    let (ctx, _) = signed_in_context(&server, "t1", "r1").await;
    let err = ctx
        .api()
        .auth_fetch(&ApiRequest::get(endpoints::ME))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert!(err.requires_sign_in());
    assert!(ctx.tokens().get_access_token().await.unwrap().is_none());
    assert!(ctx.tokens().get_refresh_token().await.unwrap().is_none());
}

#[tokio::test]
async fn test_401_without_refresh_token_is_returned_as_is() {
    let server = MockServer::start().await;
    mount_me_unauthorized(&server, "t1").await;
    mount_refresh(&server, "r1", "t2", 0).await;

    let (ctx, _) = context(&server);
    ctx.tokens().set_access_token("t1").await.unwrap();

    let response = ctx
        .api()
        .auth_fetch(&ApiRequest::get(endpoints::ME))
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_missing_token_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (ctx, _) = context(&server);
    let err = ctx
        .api()
        .auth_fetch(&ApiRequest::get(endpoints::ME))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NoToken));
}

#[tokio::test]
async fn test_refresh_rejection_is_reported() {
    let server = MockServer::start().await;
    mount_me_unauthorized(&server, "t1").await;
    Mock::given(method("POST"))
        .and(path("/users/refresh-token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid refresh token"))
        .expect(1)
        .mount(&server)
        .await;

    let (ctx, _) = signed_in_context(&server, "t1", "r1").await;
    let err = ctx
        .api()
        .auth_fetch(&ApiRequest::get(endpoints::ME))
        .await
        .unwrap_err();

    let ApiError::RefreshFailed(reason) = err else {
        panic!("expected RefreshFailed, got {err:?}");
    };
    assert!(reason.contains("400"));
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh() {
    let server = MockServer::start().await;
    mount_me_unauthorized(&server, "t1").await;
    Mock::given(method("POST"))
        .and(path("/users/refresh-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "token": "t2" }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_me(&server, "t2", "u1").await;

    let (ctx, _) = signed_in_context(&server, "t1", "r1").await;
    let req = ApiRequest::get(endpoints::ME);
    let responses = join_all((0..5).map(|_| ctx.api().auth_fetch(&req))).await;

    for response in responses {
        assert_eq!(response.unwrap().status(), 200);
    }
    assert_eq!(
        ctx.tokens().get_access_token().await.unwrap().as_deref(),
        Some("t2")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_401s_across_tasks_share_one_refresh() {
    let server = MockServer::start().await;
    mount_me_unauthorized(&server, "t1").await;
    Mock::given(method("POST"))
        .and(path("/users/refresh-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "token": "t2" }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_me(&server, "t2", "u1").await;

    let (ctx, _) = signed_in_context(&server, "t1", "r1").await;
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let api = ctx.api().clone();
            tokio::spawn(async move { api.auth_fetch(&ApiRequest::get(endpoints::ME)).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().status(), 200);
    }
}

#[tokio::test]
async fn test_late_caller_reuses_replaced_token() {
    let server = MockServer::start().await;
    mount_me_unauthorized(&server, "t1").await;
    mount_refresh(&server, "r1", "t2", 1).await;
    mount_me(&server, "t2", "u1").await;

    let (ctx, _) = signed_in_context(&server, "t1", "r1").await;
    let req = ApiRequest::get(endpoints::ME);

    ctx.api().auth_fetch(&req).await.unwrap();
    // A second refresh round for the same stale token must not hit the server.
    ctx.tokens().set_access_token("t1").await.unwrap();
    let response = ctx.api().auth_fetch(&req).await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_logout_during_refresh_keeps_tokens_cleared() {
    let server = MockServer::start().await;
    mount_me_unauthorized(&server, "t1").await;
    Mock::given(method("POST"))
        .and(path("/users/refresh-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "token": "t2" }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(bearer_token("t2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (ctx, _) = signed_in_context(&server, "t1", "r1").await;
    let api = ctx.api().clone();
    let fetch =
        tokio::spawn(async move { api.auth_fetch(&ApiRequest::get(endpoints::ME)).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    ctx.logout().await.unwrap();

    let err = fetch.await.unwrap().unwrap_err();
    assert!(matches!(err, ApiError::SessionEnded));
    assert!(ctx.tokens().get_access_token().await.unwrap().is_none());
    assert!(ctx.tokens().get_refresh_token().await.unwrap().is_none());
}

#[tokio::test]
async fn test_new_session_does_not_join_refresh_from_old_one() {
    let server = MockServer::start().await;
    mount_me_unauthorized(&server, "t1").await;
    mount_refresh(&server, "r1", "t2", 1).await;
    mount_refresh(&server, "r9", "t3", 1).await;
    mount_me(&server, "t2", "u1").await;
    mount_me(&server, "t3", "u1").await;

    let (ctx, _) = signed_in_context(&server, "t1", "r1").await;
    let req = ApiRequest::get(endpoints::ME);
    ctx.api().auth_fetch(&req).await.unwrap();

    ctx.logout().await.unwrap();
    // Signing in again with an identical (already expired) access token.
    ctx.tokens().set_tokens("t1", "r9").await.unwrap();
    ctx.api().auth_fetch(&req).await.unwrap();

    assert_eq!(
        ctx.tokens().get_access_token().await.unwrap().as_deref(),
        Some("t3")
    );
}
