//! Session listing and revocation, plus the authenticated user endpoint.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::*;

#[tokio::test]
async fn fresh_registration_lists_one_current_session() {
    let app = build_test_app();
    let registered = register(&app, "user@test.com", "aaaaaaaaaaaa1").await;
    assert_eq!(registered.status(), StatusCode::CREATED);

    let response = get_with_cookies(&app, "/sessions", &access_cookie(&registered)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let sessions = body_json(response).await;
    let sessions = sessions.as_array().expect("array of sessions");
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["currentSession"], true);
    assert!(sessions[0]["expiresAt"].is_string());
}

#[tokio::test]
async fn sessions_list_newest_first_and_flag_only_the_caller() {
    let app = build_test_app();
    register(&app, "multi@test.com", TEST_PASSWORD).await;
    let second = login(&app, "multi@test.com", TEST_PASSWORD).await;

    let response = get_with_cookies(&app, "/sessions", &access_cookie(&second)).await;
    let sessions = body_json(response).await;
    let sessions = sessions.as_array().unwrap();

    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["currentSession"], true);
    assert_eq!(sessions[1]["currentSession"], false);
}

#[tokio::test]
async fn sessions_require_an_access_token() {
    let app = build_test_app();

    let response = get(&app, "/sessions").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_ACCESS_TOKEN");
    assert_eq!(body["error"], "Not authorized");
}

#[tokio::test]
async fn sessions_reject_a_refresh_token_as_access_token() {
    let app = build_test_app();
    let registered = register(&app, "mixup@test.com", TEST_PASSWORD).await;
    let refresh = cookie_value(&registered, "refreshToken").unwrap();

    let response = get_with_cookies(&app, "/sessions", &format!("accessToken={refresh}")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_ACCESS_TOKEN");
}

#[tokio::test]
async fn revoking_another_device_keeps_the_caller_signed_in() {
    let app = build_test_app();
    let first = register(&app, "devices@test.com", TEST_PASSWORD).await;
    let second = login(&app, "devices@test.com", TEST_PASSWORD).await;
    let caller = access_cookie(&second);

    let listed = body_json(get_with_cookies(&app, "/sessions", &caller).await).await;
    let other_id = listed[1]["id"].as_str().unwrap().to_string();

    let response = delete_with_cookies(&app, &format!("/sessions/{other_id}"), &caller).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(find_set_cookie(&response, "accessToken").is_none());
    assert_eq!(
        body_json(response).await["message"],
        "Device logged out successfully."
    );

    let remaining = body_json(get_with_cookies(&app, "/sessions", &caller).await).await;
    assert_eq!(remaining.as_array().unwrap().len(), 1);

    let stale = get_with_cookies(&app, "/auth/refresh", &refresh_cookie(&first)).await;
    assert_eq!(stale.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn revoking_the_current_session_clears_cookies() {
    let app = build_test_app();
    let registered = register(&app, "self@test.com", TEST_PASSWORD).await;
    let caller = access_cookie(&registered);

    let listed = body_json(get_with_cookies(&app, "/sessions", &caller).await).await;
    let current_id = listed[0]["id"].as_str().unwrap().to_string();

    let response = delete_with_cookies(&app, &format!("/sessions/{current_id}"), &caller).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(clears_cookie(&response, "accessToken"));
    assert!(clears_cookie(&response, "refreshToken"));
    assert_eq!(app.store.session_count().await, 0);
}

#[tokio::test]
async fn revoking_someone_elses_session_is_not_found() {
    let app = build_test_app();
    let alice = register(&app, "alice@test.com", TEST_PASSWORD).await;
    let bob = register(&app, "bob@test.com", TEST_PASSWORD).await;

    let bob_sessions = body_json(get_with_cookies(&app, "/sessions", &access_cookie(&bob)).await).await;
    let bob_session = bob_sessions[0]["id"].as_str().unwrap().to_string();

    let response =
        delete_with_cookies(&app, &format!("/sessions/{bob_session}"), &access_cookie(&alice)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.store.session_count().await, 2);
}

#[tokio::test]
async fn revoking_an_unknown_session_is_not_found() {
    let app = build_test_app();
    let registered = register(&app, "ghost@test.com", TEST_PASSWORD).await;

    let response = delete_with_cookies(
        &app,
        &format!("/sessions/{}", Uuid::new_v4()),
        &access_cookie(&registered),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn revoking_a_malformed_id_is_bad_request() {
    let app = build_test_app();
    let registered = register(&app, "typo@test.com", TEST_PASSWORD).await;

    let response =
        delete_with_cookies(&app, "/sessions/not-a-uuid", &access_cookie(&registered)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// GET /user
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_user_returns_the_profile_without_the_hash() {
    let app = build_test_app();
    let registered = register(&app, "me@test.com", TEST_PASSWORD).await;

    let response = get_with_cookies(&app, "/user", &access_cookie(&registered)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["email"], "me@test.com");
    assert_eq!(body["verified"], json!(false));
    assert!(body["id"].is_string());
    assert!(body["createdAt"].is_string());
    assert!(body.get("passwordHash").is_none());
}

#[tokio::test]
async fn get_user_requires_authentication() {
    let app = build_test_app();

    let response = get_with_cookies(&app, "/user", "accessToken=").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
