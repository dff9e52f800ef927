use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::test_support;

#[tokio::test]
#[ignore = "needs local postgres and redis"]
async fn signup_login_and_me() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({
                "email": "Ada@Example.com",
                "fullName": "Ada Lovelace",
                "password": "analytical-engine",
            })),
        ))
        .await
        .expect("signup");
    let status = response.status();
    let created = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["user"]["email"], "ada@example.com");
    assert_eq!(created["user"]["is_admin"], false);
    assert_eq!(created["user"]["is_educator"], false);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "ada@example.com", "password": "analytical-engine"})),
        ))
        .await
        .expect("login");
    assert_eq!(response.status(), StatusCode::OK);
    let login = test_support::read_json(response).await;
    let token = login["access_token"].as_str().expect("token").to_string();

    let response = ctx
        .app
        .oneshot(test_support::json_request(Method::GET, "/api/v1/auth/me", Some(&token), None))
        .await
        .expect("me");
    assert_eq!(response.status(), StatusCode::OK);
    let me = test_support::read_json(response).await;
    assert_eq!(me["id"], created["user"]["id"]);
}

#[tokio::test]
#[ignore = "needs local postgres and redis"]
async fn duplicate_signup_conflicts() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(ctx.state.db(), "taken@example.com", "password-123", test_support::PLAIN)
        .await;

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({
                "email": "taken@example.com",
                "full_name": "Someone Else",
                "password": "password-456",
            })),
        ))
        .await
        .expect("signup");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "needs local postgres and redis"]
async fn login_is_rate_limited_per_email() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(ctx.state.db(), "grace@example.com", "password-123", test_support::PLAIN)
        .await;

    let mut last_status = StatusCode::OK;
    for _ in 0..11 {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({"email": "grace@example.com", "password": "wrong-password"})),
            ))
            .await
            .expect("login");
        last_status = response.status();
    }

    assert_eq!(last_status, StatusCode::TOO_MANY_REQUESTS);
}
