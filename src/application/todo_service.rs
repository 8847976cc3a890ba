use crate::domain::error::DomainError;
use crate::domain::repository::TodoRepository;
use crate::domain::todo::{CreateTodo, Todo, TodoPatch, TodoStats, TodoStatus};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Todo operations on behalf of an authenticated owner.
pub struct TodoService {
    repository: Arc<dyn TodoRepository>,
}

impl TodoService {
    pub fn new(repository: Arc<dyn TodoRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, req), fields(user_id = owner_id))]
    pub async fn create_todo(&self, owner_id: &str, req: CreateTodo) -> Result<Todo> {
        req.validate()?;
        let todo = self.repository.insert_todo(owner_id, req).await?;
        info!(todo_id = %todo.id, "Todo created");
        Ok(todo)
    }

    #[instrument(skip(self), fields(user_id = owner_id))]
    pub async fn list_todos(&self, owner_id: &str, status: Option<TodoStatus>) -> Result<Vec<Todo>> {
        self.repository.list_todos(owner_id, status).await
    }

    #[instrument(skip(self), fields(user_id = owner_id, todo_id = id))]
    pub async fn get_todo(&self, id: &str, owner_id: &str) -> Result<Todo> {
        let todo = self
            .repository
            .find_todo(id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Todo not found".to_string()))?;

        if todo.user_id != owner_id {
            warn!("Todo belongs to another user");
            return Err(
                DomainError::Forbidden("Not authorized to access this todo".to_string()).into(),
            );
        }
        Ok(todo)
    }

    #[instrument(skip(self, patch), fields(user_id = owner_id, todo_id = id))]
    pub async fn update_todo(&self, id: &str, owner_id: &str, patch: TodoPatch) -> Result<Todo> {
        patch.validate()?;
        let todo = self.repository.update_todo(id, owner_id, patch).await?;
        info!(status = ?todo.status, "Todo updated");
        Ok(todo)
    }

    #[instrument(skip(self), fields(user_id = owner_id, todo_id = id))]
    pub async fn delete_todo(&self, id: &str, owner_id: &str) -> Result<()> {
        self.repository.delete_todo(id, owner_id).await?;
        info!("Todo deleted");
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = owner_id))]
    pub async fn stats(&self, owner_id: &str) -> Result<TodoStats> {
        let todos = self.repository.list_todos(owner_id, None).await?;
        Ok(TodoStats::from_todos(&todos))
    }
}
