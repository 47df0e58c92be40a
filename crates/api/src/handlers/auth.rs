//! Handlers for the `/auth` resource.

use axum::extract::{Path, State};
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use latchkey_core::credentials::{normalize_email, validate_password_strength};
use latchkey_core::error::CoreError;
use latchkey_db::models::user::UserResponse;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::auth::cookies::{
    clear_auth_cookies, set_auth_cookies, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
};
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::response::MessageResponse;
use crate::services::session_lifecycle::{self, LoginInput, RegisterInput};
use crate::services::verification_flow::{self, INVALID_VERIFICATION_LINK};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(deserialize_with = "normalized_email")]
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
    #[serde(rename = "confirmPassword")]
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

/// Request body for `POST /auth/login`. The password is only required to be
/// present so accounts predating a stricter policy can still sign in.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(deserialize_with = "normalized_email")]
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/password/forgot`.
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[serde(deserialize_with = "normalized_email")]
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// Request body for `POST /auth/password/reset`.
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[serde(rename = "verificationCode")]
    #[validate(custom(function = "validate_code_format"))]
    pub verification_code: String,
    #[serde(rename = "newPassword")]
    #[validate(custom(function = "validate_password_strength"))]
    pub new_password: String,
    #[serde(rename = "confirmNewPassword")]
    #[validate(must_match(other = "new_password", message = "Passwords do not match"))]
    pub confirm_new_password: String,
}

fn normalized_email<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(normalize_email(&raw))
}

fn validate_code_format(code: &str) -> Result<(), ValidationError> {
    parse_code(code).map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("invalid_code");
        err.message = Some(INVALID_VERIFICATION_LINK.into());
        err
    })
}

/// Parse an opaque code from a link or body. Malformed codes are a 400.
fn parse_code(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::Core(CoreError::Validation(INVALID_VERIFICATION_LINK.into())))
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /auth/register
///
/// Create an account and sign the caller in. Returns 201 with the new user.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, CookieJar, Json<UserResponse>)> {
    let (user, tokens) = session_lifecycle::register(
        &state,
        RegisterInput {
            email: input.email,
            password: input.password,
            user_agent: user_agent(&headers),
        },
    )
    .await?;

    let jar = set_auth_cookies(jar, tokens, &state);
    Ok((StatusCode::CREATED, jar, Json(user)))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    let tokens = session_lifecycle::login(
        &state,
        LoginInput {
            email: input.email,
            password: input.password,
            user_agent: user_agent(&headers),
        },
    )
    .await?;

    let jar = set_auth_cookies(jar, tokens, &state);
    Ok((jar, Json(MessageResponse::new("Login successful"))))
}

/// GET /auth/logout
///
/// Always succeeds and always clears both cookies.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let access_token = jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_owned());
    session_lifecycle::logout(&state, access_token.as_deref()).await;

    let jar = clear_auth_cookies(jar, &state);
    (jar, Json(MessageResponse::new("Logout successful")))
}

/// GET /auth/refresh
///
/// Rotate both cookies. Any authentication failure also clears them so the
/// browser stops replaying a dead token.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), (CookieJar, AppError)> {
    let refresh_token = jar.get(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_owned());

    match session_lifecycle::refresh(&state, refresh_token.as_deref()).await {
        Ok(tokens) => {
            let jar = set_auth_cookies(jar, tokens, &state);
            Ok((jar, Json(MessageResponse::new("Access token refreshed"))))
        }
        Err(err) if err.is_unauthorized() => Err((clear_auth_cookies(jar, &state), err)),
        Err(err) => Err((jar, err)),
    }
}

/// GET /auth/email/verify/{code}
pub async fn verify_email(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let code = parse_code(&code)?;
    verification_flow::verify_email(&state, code).await?;
    Ok(Json(MessageResponse::new("Email verified successfully.")))
}

/// POST /auth/password/forgot
///
/// Always 200 for a well-formed email, registered or not.
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    verification_flow::send_password_reset(&state, &input.email).await?;
    Ok(Json(MessageResponse::new(
        "If an account exists with that email, a reset link has been sent.",
    )))
}

/// POST /auth/password/reset
pub async fn reset_password(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(input): ValidatedJson<ResetPasswordRequest>,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    let code = parse_code(&input.verification_code)?;
    verification_flow::reset_password(&state, code, input.new_password).await?;

    let jar = clear_auth_cookies(jar, &state);
    Ok((jar, Json(MessageResponse::new("Password was reset successfully"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn register_request_normalizes_email() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "email": "  Ada@Example.COM ",
            "password": "aaaaaaaaaaaa1",
            "confirmPassword": "aaaaaaaaaaaa1",
        }))
        .unwrap();
        assert_eq!(req.email, "ada@example.com");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn register_request_reports_password_mismatch() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "email": "ada@example.com",
            "password": "aaaaaaaaaaaa1",
            "confirmPassword": "aaaaaaaaaaaa2",
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("confirmPassword") || fields.contains_key("confirm_password"));
    }

    #[test]
    fn login_request_skips_password_policy() {
        let req: LoginRequest = serde_json::from_value(serde_json::json!({
            "email": "ada@example.com",
            "password": "short",
        }))
        .unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn reset_request_rejects_malformed_code() {
        let req: ResetPasswordRequest = serde_json::from_value(serde_json::json!({
            "verificationCode": "not-a-code",
            "newPassword": "a-brand-new-password",
            "confirmNewPassword": "a-brand-new-password",
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("verificationCode") || fields.contains_key("verification_code"));
    }

    #[test]
    fn parse_code_maps_to_validation_error() {
        assert_matches!(
            parse_code("xyz"),
            Err(AppError::Core(CoreError::Validation(_)))
        );
        assert!(parse_code(&Uuid::new_v4().to_string()).is_ok());
    }
}
