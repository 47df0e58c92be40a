//! The `accessToken` / `refreshToken` cookie pair.
//!
//! Both cookies are `HttpOnly` and `SameSite=Strict`, and `Secure` everywhere
//! but development. The refresh cookie is scoped to [`REFRESH_PATH`] so the
//! browser only ever sends it to the refresh endpoint.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::auth::jwt::{TokenKind, TokenPair};
use crate::state::AppState;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Path of the refresh endpoint, and of the refresh cookie.
pub const REFRESH_PATH: &str = "/auth/refresh";

fn base_cookie(name: &'static str, value: String, path: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path(path)
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .build()
}

fn to_cookie_duration(duration: chrono::Duration) -> time::Duration {
    time::Duration::seconds(duration.num_seconds())
}

/// Add both token cookies to `jar`, with lifetimes matching the tokens.
pub fn set_auth_cookies(jar: CookieJar, tokens: TokenPair, state: &AppState) -> CookieJar {
    let secure = state.config.secure_cookies();

    let mut access = base_cookie(ACCESS_TOKEN_COOKIE, tokens.access_token, "/", secure);
    access.set_max_age(to_cookie_duration(state.tokens.ttl(TokenKind::Access)));

    let mut refresh = base_cookie(REFRESH_TOKEN_COOKIE, tokens.refresh_token, REFRESH_PATH, secure);
    refresh.set_max_age(to_cookie_duration(state.tokens.ttl(TokenKind::Refresh)));

    jar.add(access).add(refresh)
}

/// Emit expired versions of both cookies, each on its own path.
///
/// Removal cookies are added unconditionally: the refresh cookie is never
/// sent outside its path, so the jar usually does not know about it.
pub fn clear_auth_cookies(jar: CookieJar, state: &AppState) -> CookieJar {
    let secure = state.config.secure_cookies();

    let mut access = base_cookie(ACCESS_TOKEN_COOKIE, String::new(), "/", secure);
    access.make_removal();

    let mut refresh = base_cookie(REFRESH_TOKEN_COOKIE, String::new(), REFRESH_PATH, secure);
    refresh.make_removal();

    jar.add(access).add(refresh)
}
