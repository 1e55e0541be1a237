use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub priority: i32,
    pub complete: bool,
    pub owner_id: i64,
}

/// Writable fields of a todo, shared by create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct TodoFields {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: i32,
    #[serde(default)]
    pub complete: bool,
}
