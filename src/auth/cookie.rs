//! Session cookie helpers.
//!
//! The cookie is `HttpOnly` with `Path=/`. `Secure` and `SameSite` are not
//! set.

use axum_extra::extract::cookie::{Cookie, CookieJar};

/// Cookie holding the session JWT.
pub const SESSION_COOKIE_NAME: &str = "access_token";

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token))
        .http_only(true)
        .path("/")
        .build()
}

/// Overwrites the session cookie with an empty, already expired one.
pub fn cleared_session_cookie() -> Cookie<'static> {
    let mut cookie = session_cookie(String::new());
    cookie.make_removal();
    cookie
}

/// The session token sent with the request. An empty value counts as no
/// cookie.
pub fn session_token(jar: &CookieJar) -> Option<&str> {
    jar.get(SESSION_COOKIE_NAME)
        .map(|c| c.value())
        .filter(|value| !value.is_empty())
}
