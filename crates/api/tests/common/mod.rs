#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use latchkey_api::auth::jwt::JwtConfig;
use latchkey_api::config::{AppEnv, ServerConfig};
use latchkey_api::router::build_app_router;
use latchkey_api::state::AppState;
use latchkey_db::store::MemoryStore;
use latchkey_mail::{MailError, MailReceipt, Mailer, OutgoingEmail};

pub const TEST_ORIGIN: &str = "http://localhost:5173";
pub const TEST_PASSWORD: &str = "aaaaaaaaaaaa1";

/// Build a test `ServerConfig` with safe defaults.
///
/// `APP_ENV` is `test` so cookies are `Secure` and the rate limiter is active.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        app_env: AppEnv::Test,
        app_origin: TEST_ORIGIN.to_string(),
        request_timeout_secs: 30,
        expiry_sweep_interval_secs: 300,
        jwt: JwtConfig {
            secret: "integration-access-secret".to_string(),
            refresh_secret: "integration-refresh-secret".to_string(),
            access_token_expiry_mins: 30,
            refresh_token_expiry_days: 30,
        },
    }
}

// ---------------------------------------------------------------------------
// Recording mailer
// ---------------------------------------------------------------------------

/// Mailer that keeps every message and can be told to fail.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<OutgoingEmail> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<MailReceipt, MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Provider {
                status: 503,
                body: "provider unavailable".to_string(),
            });
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(MailReceipt {
            id: Some(format!("msg-{}", uuid::Uuid::new_v4())),
        })
    }
}

// ---------------------------------------------------------------------------
// Test app
// ---------------------------------------------------------------------------

/// The full router over an in-memory store, plus handles to inspect it.
#[derive(Clone)]
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
}

pub fn build_test_app() -> TestApp {
    build_test_app_with(test_config())
}

/// Build the full application router with all middleware layers. This is
/// the same builder `main.rs` uses, so tests exercise the production stack.
pub fn build_test_app_with(config: ServerConfig) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState::new(store.clone(), mailer.clone(), config);
    let router = build_app_router(state.clone());

    TestApp {
        router,
        state,
        store,
        mailer,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &TestApp, request: Request<Body>) -> Response<Body> {
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &TestApp, uri: &str) -> Response<Body> {
    get_with_cookies(app, uri, "").await
}

pub async fn get_with_cookies(app: &TestApp, uri: &str, cookies: &str) -> Response<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if !cookies.is_empty() {
        builder = builder.header(COOKIE, cookies);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

pub async fn delete_with_cookies(app: &TestApp, uri: &str, cookies: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(COOKIE, cookies)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: &TestApp, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_json_with_headers(app, uri, body, &[]).await
}

pub async fn post_json_with_headers(
    app: &TestApp,
    uri: &str,
    body: serde_json::Value,
    headers: &[(&str, &str)],
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// ---------------------------------------------------------------------------
// Cookie helpers
// ---------------------------------------------------------------------------

/// Raw `Set-Cookie` header values of a response.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_owned)
        .collect()
}

/// The `Set-Cookie` value for `name`, if the response sets it.
pub fn find_set_cookie(response: &Response<Body>, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    set_cookies(response)
        .into_iter()
        .find(|c| c.starts_with(&prefix))
}

/// Value of cookie `name` as set by the response, ignoring removals.
pub fn cookie_value(response: &Response<Body>, name: &str) -> Option<String> {
    find_set_cookie(response, name)
        .and_then(|c| c.split(';').next().map(str::to_owned))
        .and_then(|pair| pair.split_once('=').map(|(_, v)| v.to_owned()))
        .filter(|v| !v.is_empty())
}

/// `Cookie` header carrying the access token set by `response`.
pub fn access_cookie(response: &Response<Body>) -> String {
    format!(
        "accessToken={}",
        cookie_value(response, "accessToken").expect("response sets accessToken")
    )
}

/// `Cookie` header carrying the refresh token set by `response`.
pub fn refresh_cookie(response: &Response<Body>) -> String {
    format!(
        "refreshToken={}",
        cookie_value(response, "refreshToken").expect("response sets refreshToken")
    )
}

/// Whether `response` instructs the browser to drop cookie `name`.
pub fn clears_cookie(response: &Response<Body>, name: &str) -> bool {
    find_set_cookie(response, name)
        .map(|c| c.starts_with(&format!("{name}=;")) && c.contains("Max-Age=0"))
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Flow helpers
// ---------------------------------------------------------------------------

pub async fn register(app: &TestApp, email: &str, password: &str) -> Response<Body> {
    post_json(
        app,
        "/auth/register",
        serde_json::json!({
            "email": email,
            "password": password,
            "confirmPassword": password,
        }),
    )
    .await
}

pub async fn login(app: &TestApp, email: &str, password: &str) -> Response<Body> {
    post_json(
        app,
        "/auth/login",
        serde_json::json!({ "email": email, "password": password }),
    )
    .await
}

/// The code at the end of the most recently mailed link.
pub fn last_mailed_code(app: &TestApp) -> String {
    let email = app.mailer.last().expect("an email was sent");
    let url = email
        .text
        .split_whitespace()
        .find(|w| w.starts_with(TEST_ORIGIN))
        .expect("email contains a link")
        .to_string();
    url.rsplit(['/', '=']).next().unwrap().to_string()
}
