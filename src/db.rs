use anyhow::Context;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use sqlx::{pool::PoolConnection, postgres::PgPoolOptions, PgPool, Postgres};
use thiserror::Error;
use tracing::error;

use crate::{auth::repo::UserRepo, state::AppState, todos::repo::TodoRepo};

#[cfg(test)]
pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub(crate) fn from_sqlx(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                let constraint = db.constraint().unwrap_or("unknown").to_string();
                return StoreError::Conflict(constraint);
            }
        }
        StoreError::Database(e)
    }
}

/// Everything a single request may do against storage.
pub trait Session: UserRepo + TodoRepo + Send {}

impl<T: UserRepo + TodoRepo + Send> Session for T {}

/// Hands out one storage session per request.
#[async_trait]
pub trait Database: Send + Sync {
    async fn session(&self) -> Result<Box<dyn Session>, StoreError>;
}

#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

/// A pooled connection owned by one request. Returned to the pool on drop.
pub struct PgSession {
    pub(crate) conn: PoolConnection<Postgres>,
}

#[async_trait]
impl Database for PgDatabase {
    async fn session(&self) -> Result<Box<dyn Session>, StoreError> {
        let conn = self.pool.acquire().await?;
        Ok(Box::new(PgSession { conn }))
    }
}

/// Storage session acquired at request entry.
pub struct Db(pub Box<dyn Session>);

#[async_trait]
impl FromRequestParts<AppState> for Db {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state.db.session().await.map(Db).map_err(|e| {
            error!(error = %e, "acquire db session failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Database unavailable".to_string(),
            )
        })
    }
}
