use async_trait::async_trait;

use crate::db::{PgSession, StoreError};
use crate::todos::repo_types::{Todo, TodoFields};

/// Todo storage. Every operation is scoped to `owner_id`; rows owned by
/// someone else behave as if they did not exist.
#[async_trait]
pub trait TodoRepo: Send {
    async fn list_todos(&mut self, owner_id: i64) -> Result<Vec<Todo>, StoreError>;
    async fn get_todo(&mut self, owner_id: i64, id: i64) -> Result<Option<Todo>, StoreError>;
    async fn create_todo(&mut self, owner_id: i64, fields: TodoFields) -> Result<Todo, StoreError>;
    async fn update_todo(
        &mut self,
        owner_id: i64,
        id: i64,
        fields: TodoFields,
    ) -> Result<Option<Todo>, StoreError>;
    /// Returns whether a row was deleted.
    async fn delete_todo(&mut self, owner_id: i64, id: i64) -> Result<bool, StoreError>;
}

#[async_trait]
impl TodoRepo for PgSession {
    async fn list_todos(&mut self, owner_id: i64) -> Result<Vec<Todo>, StoreError> {
        let rows = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, title, description, priority, complete, owner_id
            FROM todos
            WHERE owner_id = $1
            ORDER BY id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(rows)
    }

    async fn get_todo(&mut self, owner_id: i64, id: i64) -> Result<Option<Todo>, StoreError> {
        let row = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, title, description, priority, complete, owner_id
            FROM todos
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(row)
    }

    async fn create_todo(&mut self, owner_id: i64, fields: TodoFields) -> Result<Todo, StoreError> {
        let row = sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (title, description, priority, complete, owner_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, priority, complete, owner_id
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.priority)
        .bind(fields.complete)
        .bind(owner_id)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(row)
    }

    async fn update_todo(
        &mut self,
        owner_id: i64,
        id: i64,
        fields: TodoFields,
    ) -> Result<Option<Todo>, StoreError> {
        let row = sqlx::query_as::<_, Todo>(
            r#"
            UPDATE todos
               SET title = $1, description = $2, priority = $3, complete = $4
             WHERE id = $5 AND owner_id = $6
            RETURNING id, title, description, priority, complete, owner_id
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.priority)
        .bind(fields.complete)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(row)
    }

    async fn delete_todo(&mut self, owner_id: i64, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
