use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use axum_extra::extract::CookieJar;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use super::claims::{Claims, Identity};
use super::cookie::session_token;
use crate::{config::JwtConfig, state::AppState};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("could not validate token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Signing and verification keys derived from `JwtConfig`.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from_config(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn from_config(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            algorithm: config.algorithm,
            ttl: Duration::minutes(config.ttl_minutes),
        }
    }

    /// Keys for `secret` with the default algorithm and session lifetime.
    #[cfg(test)]
    pub fn new(secret: &str) -> Self {
        Self::from_config(&JwtConfig::new(secret))
    }

    /// Mint a session token for a verified user.
    pub fn issue(&self, username: &str, user_id: i64) -> anyhow::Result<String> {
        self.issue_at(username, user_id, OffsetDateTime::now_utc())
    }

    pub(crate) fn issue_at(
        &self,
        username: &str,
        user_id: i64,
        now: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let exp = now + self.ttl;
        let claims = Claims {
            sub: Some(username.to_string()),
            id: Some(user_id),
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)?;
        debug!(user_id, "jwt signed");
        Ok(token)
    }

    /// Recover the caller's identity from the session cookie value.
    ///
    /// No token means anonymous (`Ok(None)`). A token that is present but
    /// fails decoding, signature or expiry checks is an error. A valid token
    /// missing `sub` or `id` is anonymous as well.
    pub fn validate(&self, token: Option<&str>) -> Result<Option<Identity>, TokenError> {
        let Some(token) = token else {
            return Ok(None);
        };
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        let identity = data.claims.identity();
        if let Some(identity) = &identity {
            debug!(user_id = identity.id, username = %identity.username, "jwt verified");
        }
        Ok(identity)
    }
}

/// The caller's identity, if any. Rejects with 401 only when a session cookie
/// is present but cannot be validated.
pub struct CurrentUser(pub Option<Identity>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        match keys.validate(session_token(&jar)) {
            Ok(identity) => Ok(CurrentUser(identity)),
            Err(e) => {
                warn!(error = %e, "invalid or expired session token");
                Err((
                    StatusCode::UNAUTHORIZED,
                    "Could not validate user.".to_string(),
                ))
            }
        }
    }
}

/// Like `CurrentUser` but anonymous callers are turned away too.
pub struct AuthUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(identity) = CurrentUser::from_request_parts(parts, state).await?;
        identity
            .map(AuthUser)
            .ok_or((StatusCode::UNAUTHORIZED, "Not authenticated".to_string()))
    }
}
