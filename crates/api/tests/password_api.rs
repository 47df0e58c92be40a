//! Forgot/reset password over HTTP, including the request rate limit.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use latchkey_core::verification::VerificationCodeType;
use latchkey_db::store::UserStore;
use serde_json::json;
use uuid::Uuid;

use common::*;

const NEW_PASSWORD: &str = "bbbbbbbbbbbb2";

async fn forgot(app: &TestApp, email: &str) -> axum::http::Response<axum::body::Body> {
    post_json(app, "/auth/password/forgot", json!({ "email": email })).await
}

async fn reset(app: &TestApp, code: &str, password: &str) -> axum::http::Response<axum::body::Body> {
    post_json(
        app,
        "/auth/password/reset",
        json!({
            "verificationCode": code,
            "newPassword": password,
            "confirmNewPassword": password,
        }),
    )
    .await
}

#[tokio::test]
async fn forgot_for_unknown_email_is_ok_and_sends_nothing() {
    let app = build_test_app();

    let response = forgot(&app, "nobody@test.com").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.mailer.sent().is_empty());
    assert_eq!(app.store.code_count().await, 0);
}

#[tokio::test]
async fn forgot_for_known_email_mails_a_reset_link() {
    let app = build_test_app();
    register(&app, "reset@test.com", TEST_PASSWORD).await;

    let response = forgot(&app, "Reset@Test.com").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("ratelimit-remaining"));

    let email = app.mailer.last().unwrap();
    assert_eq!(email.to, "reset@test.com");
    assert!(email.text.contains("/auth/password/reset?code="));
}

#[tokio::test]
async fn forgot_replaces_outstanding_reset_codes() {
    let app = build_test_app();
    register(&app, "again@test.com", TEST_PASSWORD).await;
    let user = app
        .store
        .find_user_by_email("again@test.com")
        .await
        .unwrap()
        .unwrap();

    forgot(&app, "again@test.com").await;
    let first = last_mailed_code(&app);
    forgot(&app, "again@test.com").await;

    let codes = app
        .store
        .codes_for_user(user.id, VerificationCodeType::PasswordReset)
        .await;
    assert_eq!(codes.len(), 1);

    let response = reset(&app, &first, NEW_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn reset_changes_password_and_ends_every_session() {
    let app = build_test_app();
    register(&app, "change@test.com", TEST_PASSWORD).await;
    login(&app, "change@test.com", TEST_PASSWORD).await;
    assert_eq!(app.store.session_count().await, 2);

    forgot(&app, "change@test.com").await;
    let code = last_mailed_code(&app);

    let response = reset(&app, &code, NEW_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(clears_cookie(&response, "accessToken"));
    assert_eq!(app.store.session_count().await, 0);

    let old = login(&app, "change@test.com", TEST_PASSWORD).await;
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);
    let new = login(&app, "change@test.com", NEW_PASSWORD).await;
    assert_eq!(new.status(), StatusCode::OK);
}

#[tokio::test]
async fn reset_code_cannot_be_reused() {
    let app = build_test_app();
    register(&app, "once@test.com", TEST_PASSWORD).await;
    forgot(&app, "once@test.com").await;
    let code = last_mailed_code(&app);

    assert_eq!(reset(&app, &code, NEW_PASSWORD).await.status(), StatusCode::OK);

    let again = reset(&app, &code, "cccccccccccc3").await;
    assert_eq!(again.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn reset_with_expired_code_is_unauthorized() {
    let app = build_test_app();
    register(&app, "stale@test.com", TEST_PASSWORD).await;
    forgot(&app, "stale@test.com").await;
    let code = last_mailed_code(&app);

    let id: Uuid = code.parse().unwrap();
    assert!(app.store.set_code_expiry(id, Utc::now() - Duration::seconds(1)).await);

    let response = reset(&app, &code, NEW_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.store.session_count().await, 1);
}

#[tokio::test]
async fn reset_does_not_accept_an_email_verification_code() {
    let app = build_test_app();
    register(&app, "cross@test.com", TEST_PASSWORD).await;
    let verify_code = last_mailed_code(&app);

    let response = reset(&app, &verify_code, NEW_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn reset_validates_the_new_password() {
    let app = build_test_app();

    let response = post_json(
        &app,
        "/auth/password/reset",
        json!({
            "verificationCode": Uuid::new_v4().to_string(),
            "newPassword": "short",
            "confirmNewPassword": "short",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Rate limit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn third_forgot_request_in_the_window_is_limited() {
    let app = build_test_app();

    assert_eq!(forgot(&app, "a@test.com").await.status(), StatusCode::OK);
    assert_eq!(forgot(&app, "b@test.com").await.status(), StatusCode::OK);

    let limited = forgot(&app, "c@test.com").await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers().contains_key("retry-after"));

    let body = body_json(limited).await;
    assert_eq!(body["code"], "RATE_LIMITED");
    assert_eq!(
        body["error"],
        "Too many password reset requests. Please try again in 5 minutes."
    );
}

#[tokio::test]
async fn rate_limit_is_tracked_per_caller() {
    let app = build_test_app();
    let from = |ip: &'static str| [("x-forwarded-for", ip)];

    for _ in 0..2 {
        let response = post_json_with_headers(
            &app,
            "/auth/password/forgot",
            json!({ "email": "a@test.com" }),
            &from("203.0.113.1"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let other = post_json_with_headers(
        &app,
        "/auth/password/forgot",
        json!({ "email": "a@test.com" }),
        &from("203.0.113.2"),
    )
    .await;
    assert_eq!(other.status(), StatusCode::OK);
}

#[tokio::test]
async fn forged_forwarded_hops_share_the_proxy_appended_limit() {
    let app = build_test_app();
    let mut statuses = Vec::new();

    for i in 0..3 {
        let forwarded = format!("10.66.0.{i}, 198.51.100.7");
        let response = post_json_with_headers(
            &app,
            "/auth/password/forgot",
            json!({ "email": "a@test.com" }),
            &[("x-forwarded-for", forwarded.as_str())],
        )
        .await;
        statuses.push(response.status());
    }

    assert_eq!(
        statuses,
        [StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
    );
}

#[tokio::test]
async fn rejected_forgot_requests_do_not_use_up_the_limit() {
    let app = build_test_app();

    for _ in 0..3 {
        let response = forgot(&app, "not-an-email").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    assert_eq!(forgot(&app, "a@test.com").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn rate_limit_is_off_in_development() {
    let mut config = test_config();
    config.app_env = latchkey_api::config::AppEnv::Development;
    let app = build_test_app_with(config);

    for _ in 0..4 {
        assert_eq!(forgot(&app, "dev@test.com").await.status(), StatusCode::OK);
    }
}
