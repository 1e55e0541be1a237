use async_trait::async_trait;

use crate::auth::repo_types::{NewUser, User};
use crate::db::{PgSession, StoreError};

/// Credential store.
#[async_trait]
pub trait UserRepo: Send {
    async fn find_by_username(&mut self, username: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError>;
    /// Insert a user; `is_active` starts out true.
    async fn create_user(&mut self, user: NewUser) -> Result<User, StoreError>;
}

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, hashed_password, role, phone_number, is_active";

#[async_trait]
impl UserRepo for PgSession {
    async fn find_by_username(&mut self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(user)
    }

    async fn create_user(&mut self, user: NewUser) -> Result<User, StoreError> {
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users
                (username, email, first_name, last_name, hashed_password, role, phone_number, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.hashed_password)
        .bind(&user.role)
        .bind(&user.phone_number)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(created)
    }
}
