use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::CookieJar;
use tracing::{debug, error, instrument, warn};

use crate::{
    auth::{
        cookie::{cleared_session_cookie, session_cookie},
        dto::{LoginForm, RegisterForm},
        jwt::JwtKeys,
        pages::{login_page, register_page},
        services::{self, LoginError, RegisterError, SignedIn},
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/token", post(login_for_access_token))
        .route("/auth/", get(authentication_page).post(login))
        .route("/auth/logout", get(logout))
        .route("/auth/register", get(registration_page).post(register))
}

fn log_login_failure(username: &str, e: &LoginError) {
    match e {
        LoginError::UnknownUser => warn!(%username, "login unknown username"),
        LoginError::WrongPassword => warn!(%username, "login invalid password"),
        LoginError::Store(_) | LoginError::Token(_) => {
            error!(error = %e, %username, "login failed")
        }
    }
}

/// Opens a storage session and runs the login check. A session that cannot be
/// opened is a store failure like any other.
async fn attempt_login(state: &AppState, form: &LoginForm) -> Result<SignedIn, LoginError> {
    let keys = JwtKeys::from_ref(state);
    let mut db = state.db.session().await?;
    services::login(&mut *db, &keys, form.login_name(), &form.password).await
}

/// POST /auth/token. Sets the session cookie and answers `true`, or 401 with
/// `false`.
#[instrument(skip(state, jar, form))]
pub async fn login_for_access_token(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    match attempt_login(&state, &form).await {
        Ok(signed_in) => {
            debug!(user_id = signed_in.identity.id, "session cookie issued");
            let jar = jar.add(session_cookie(signed_in.token));
            (jar, Json(true)).into_response()
        }
        Err(e) => {
            log_login_failure(form.login_name(), &e);
            let status = match e {
                LoginError::UnknownUser | LoginError::WrongPassword => StatusCode::UNAUTHORIZED,
                LoginError::Store(_) | LoginError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(false)).into_response()
        }
    }
}

pub async fn authentication_page() -> Html<String> {
    login_page(None)
}

/// POST /auth/. Redirects home with the session cookie, or re-renders the
/// login page with a message.
#[instrument(skip(state, jar, form))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    match attempt_login(&state, &form).await {
        Ok(signed_in) => {
            debug!(user_id = signed_in.identity.id, "session cookie issued");
            let jar = jar.add(session_cookie(signed_in.token));
            (StatusCode::FOUND, jar, Redirect::to("/")).into_response()
        }
        Err(e) => {
            log_login_failure(form.login_name(), &e);
            login_page(Some(e.user_message())).into_response()
        }
    }
}

#[instrument(skip(jar))]
pub async fn logout(jar: CookieJar) -> Response {
    let jar = jar.add(cleared_session_cookie());
    (jar, login_page(Some("Logout Successful"))).into_response()
}

pub async fn registration_page() -> Html<String> {
    register_page(None)
}

#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Html<String> {
    let result = match state.db.session().await {
        Ok(mut db) => services::register(&mut *db, form).await,
        Err(e) => Err(RegisterError::Store(e)),
    };
    match result {
        Ok(_) => login_page(Some("User successfully created")),
        Err(e) => {
            match &e {
                RegisterError::Store(_) | RegisterError::Hash(_) => {
                    error!(error = %e, "registration failed")
                }
                _ => warn!(reason = %e, "registration rejected"),
            }
            register_page(Some(e.user_message()))
        }
    }
}
