use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Database, Session, StoreError};
use crate::auth::{
    repo::UserRepo,
    repo_types::{NewUser, User},
};
use crate::todos::{
    repo::TodoRepo,
    repo_types::{Todo, TodoFields},
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    todos: Vec<Todo>,
    next_user_id: i64,
    next_todo_id: i64,
}

/// In-memory stand-in for Postgres with the same uniqueness rules.
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryDatabase {
    pub async fn user_count(&self) -> usize {
        self.tables.lock().await.users.len()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn session(&self) -> Result<Box<dyn Session>, StoreError> {
        Ok(Box::new(self.clone()))
    }
}

/// A store whose pool never hands out a connection.
pub struct UnavailableDatabase;

#[async_trait]
impl Database for UnavailableDatabase {
    async fn session(&self) -> Result<Box<dyn Session>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }
}

#[async_trait]
impl UserRepo for MemoryDatabase {
    async fn find_by_username(&mut self, username: &str) -> Result<Option<User>, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&mut self, user: NewUser) -> Result<User, StoreError> {
        let mut t = self.tables.lock().await;
        if t.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict("users_username_key".into()));
        }
        if t.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("users_email_key".into()));
        }
        t.next_user_id += 1;
        let created = User {
            id: t.next_user_id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            hashed_password: user.hashed_password,
            role: user.role,
            phone_number: user.phone_number,
            is_active: true,
        };
        t.users.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl TodoRepo for MemoryDatabase {
    async fn list_todos(&mut self, owner_id: i64) -> Result<Vec<Todo>, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.todos
            .iter()
            .filter(|todo| todo.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn get_todo(&mut self, owner_id: i64, id: i64) -> Result<Option<Todo>, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.todos
            .iter()
            .find(|todo| todo.id == id && todo.owner_id == owner_id)
            .cloned())
    }

    async fn create_todo(&mut self, owner_id: i64, fields: TodoFields) -> Result<Todo, StoreError> {
        let mut t = self.tables.lock().await;
        t.next_todo_id += 1;
        let todo = Todo {
            id: t.next_todo_id,
            title: fields.title,
            description: fields.description,
            priority: fields.priority,
            complete: fields.complete,
            owner_id,
        };
        t.todos.push(todo.clone());
        Ok(todo)
    }

    async fn update_todo(
        &mut self,
        owner_id: i64,
        id: i64,
        fields: TodoFields,
    ) -> Result<Option<Todo>, StoreError> {
        let mut t = self.tables.lock().await;
        let Some(todo) = t
            .todos
            .iter_mut()
            .find(|todo| todo.id == id && todo.owner_id == owner_id)
        else {
            return Ok(None);
        };
        todo.title = fields.title;
        todo.description = fields.description;
        todo.priority = fields.priority;
        todo.complete = fields.complete;
        Ok(Some(todo.clone()))
    }

    async fn delete_todo(&mut self, owner_id: i64, id: i64) -> Result<bool, StoreError> {
        let mut t = self.tables.lock().await;
        let before = t.todos.len();
        t.todos
            .retain(|todo| !(todo.id == id && todo.owner_id == owner_id));
        Ok(t.todos.len() != before)
    }
}
