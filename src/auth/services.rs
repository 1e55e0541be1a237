use thiserror::Error;
use tracing::{info, warn};

use crate::auth::{
    claims::Identity,
    dto::RegisterForm,
    jwt::JwtKeys,
    password::{hash_password, verify_password},
    repo::UserRepo,
    repo_types::{NewUser, User},
};
use crate::db::StoreError;

pub const DEFAULT_ROLE: &str = "user";

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("no such user")]
    UnknownUser,
    #[error("wrong password")]
    WrongPassword,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("token signing failed: {0}")]
    Token(anyhow::Error),
}

impl LoginError {
    /// Message shown to the user. Both credential failures read the same.
    pub fn user_message(&self) -> &'static str {
        match self {
            LoginError::UnknownUser | LoginError::WrongPassword => {
                "Incorrect Username or Password"
            }
            LoginError::Store(_) | LoginError::Token(_) => "Unknown Error",
        }
    }
}

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("username already taken")]
    UsernameTaken,
    #[error("email already registered")]
    EmailTaken,
    #[error(transparent)]
    Store(StoreError),
    #[error("password hashing failed: {0}")]
    Hash(anyhow::Error),
}

impl From<StoreError> for RegisterError {
    fn from(e: StoreError) -> Self {
        match e {
            // Lost a race against a concurrent registration.
            StoreError::Conflict(constraint) if constraint.contains("email") => {
                RegisterError::EmailTaken
            }
            StoreError::Conflict(_) => RegisterError::UsernameTaken,
            other => RegisterError::Store(other),
        }
    }
}

impl RegisterError {
    pub fn user_message(&self) -> &'static str {
        match self {
            RegisterError::Store(_) | RegisterError::Hash(_) => "Unknown Error",
            _ => "Invalid registration request",
        }
    }
}

/// A freshly issued session.
#[derive(Debug)]
pub struct SignedIn {
    pub token: String,
    pub identity: Identity,
}

/// Check credentials and issue a session token.
pub async fn login<R>(
    users: &mut R,
    keys: &JwtKeys,
    username: &str,
    password: &str,
) -> Result<SignedIn, LoginError>
where
    R: UserRepo + ?Sized,
{
    let user = users
        .find_by_username(username)
        .await?
        .ok_or(LoginError::UnknownUser)?;

    if !verify_password(password, &user.hashed_password) {
        return Err(LoginError::WrongPassword);
    }

    let token = keys
        .issue(&user.username, user.id)
        .map_err(LoginError::Token)?;

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(SignedIn {
        token,
        identity: Identity {
            username: user.username,
            id: user.id,
        },
    })
}

/// Validate a registration, then hash and persist the new user. Nothing is
/// written unless every check passes.
pub async fn register<R>(users: &mut R, form: RegisterForm) -> Result<User, RegisterError>
where
    R: UserRepo + ?Sized,
{
    if form.password != form.password2 {
        return Err(RegisterError::PasswordMismatch);
    }
    if users.find_by_username(&form.username).await?.is_some() {
        warn!(username = %form.username, "username already taken");
        return Err(RegisterError::UsernameTaken);
    }
    if users.find_by_email(&form.email).await?.is_some() {
        warn!(email = %form.email, "email already registered");
        return Err(RegisterError::EmailTaken);
    }

    let hashed_password = hash_password(&form.password).map_err(RegisterError::Hash)?;
    let user = users
        .create_user(NewUser {
            username: form.username,
            email: form.email,
            first_name: form.firstname,
            last_name: form.lastname,
            hashed_password,
            role: form
                .role
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            phone_number: form.phone_number.filter(|p| !p.trim().is_empty()),
        })
        .await?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}
