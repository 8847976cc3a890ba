use crate::domain::todo::{CreateTodo, Todo, TodoPatch, TodoStatus};
use crate::domain::user::{NewUser, User};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Stores a new user under the next identifier. Fails with
    /// `DomainError::EmailTaken` if the email is already registered.
    async fn insert_user(&self, user: NewUser) -> Result<User>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>>;
}

/// Todo storage. Mutations check ownership under the same lock that applies
/// them, failing with `DomainError::NotFound` or `DomainError::Forbidden`.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    async fn insert_todo(&self, owner_id: &str, todo: CreateTodo) -> Result<Todo>;
    /// Most recently created first.
    async fn list_todos(&self, owner_id: &str, status: Option<TodoStatus>) -> Result<Vec<Todo>>;
    async fn find_todo(&self, id: &str) -> Result<Option<Todo>>;
    async fn update_todo(&self, id: &str, owner_id: &str, patch: TodoPatch) -> Result<Todo>;
    async fn delete_todo(&self, id: &str, owner_id: &str) -> Result<()>;
}
