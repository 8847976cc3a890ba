use crate::domain::error::DomainError;
use crate::domain::repository::TodoRepository;
use crate::domain::todo::{CreateTodo, Todo, TodoPatch, TodoStatus};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace, warn};

struct Row {
    seq: u64,
    todo: Todo,
}

#[derive(Default)]
struct TodoTable {
    last_id: u64,
    rows: HashMap<String, Row>,
}

impl TodoTable {
    /// Looks up a todo for mutation by `owner_id`.
    fn owned_mut(&mut self, id: &str, owner_id: &str) -> Result<&mut Row, DomainError> {
        let row = self
            .rows
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound("Todo not found".to_string()))?;
        if row.todo.user_id != owner_id {
            warn!(todo_id = id, user_id = owner_id, "Todo belongs to another user");
            return Err(DomainError::Forbidden(
                "Not authorized to access this todo".to_string(),
            ));
        }
        Ok(row)
    }
}

#[derive(Clone)]
pub struct InMemoryTodoRepository {
    storage: Arc<RwLock<TodoTable>>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(TodoTable::default())),
        }
    }
}

impl Default for InMemoryTodoRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    #[instrument(skip(self, todo), fields(user_id = owner_id))]
    async fn insert_todo(&self, owner_id: &str, todo: CreateTodo) -> Result<Todo> {
        let mut storage = self.storage.write().await;
        storage.last_id += 1;
        let seq = storage.last_id;
        let now = Utc::now();
        let todo = Todo {
            id: format!("todo_{}", seq),
            title: todo.title,
            description: todo.description,
            status: TodoStatus::Pending,
            created_at: now,
            updated_at: now,
            user_id: owner_id.to_string(),
        };
        storage.rows.insert(
            todo.id.clone(),
            Row {
                seq,
                todo: todo.clone(),
            },
        );
        debug!(todo_id = %todo.id, "Todo saved to memory storage");
        Ok(todo)
    }

    #[instrument(skip(self), fields(user_id = owner_id))]
    async fn list_todos(&self, owner_id: &str, status: Option<TodoStatus>) -> Result<Vec<Todo>> {
        let storage = self.storage.read().await;
        let mut rows: Vec<&Row> = storage
            .rows
            .values()
            .filter(|r| r.todo.user_id == owner_id)
            .filter(|r| status.is_none_or(|s| r.todo.status == s))
            .collect();
        rows.sort_by(|a, b| {
            b.todo
                .created_at
                .cmp(&a.todo.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        trace!(count = rows.len(), "Todos listed");
        Ok(rows.into_iter().map(|r| r.todo.clone()).collect())
    }

    #[instrument(skip(self), fields(todo_id = id))]
    async fn find_todo(&self, id: &str) -> Result<Option<Todo>> {
        let storage = self.storage.read().await;
        Ok(storage.rows.get(id).map(|r| r.todo.clone()))
    }

    #[instrument(skip(self, patch), fields(todo_id = id, user_id = owner_id))]
    async fn update_todo(&self, id: &str, owner_id: &str, patch: TodoPatch) -> Result<Todo> {
        let mut storage = self.storage.write().await;
        let row = storage.owned_mut(id, owner_id)?;
        if patch.apply(&mut row.todo, Utc::now()) {
            debug!(todo_id = id, "Todo updated in memory storage");
        } else {
            trace!(todo_id = id, "Empty patch, todo left unchanged");
        }
        Ok(row.todo.clone())
    }

    #[instrument(skip(self), fields(todo_id = id, user_id = owner_id))]
    async fn delete_todo(&self, id: &str, owner_id: &str) -> Result<()> {
        let mut storage = self.storage.write().await;
        storage.owned_mut(id, owner_id)?;
        storage.rows.remove(id);
        debug!(todo_id = id, "Todo removed from memory storage");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(title: &str) -> CreateTodo {
        CreateTodo {
            title: title.to_string(),
            description: None,
        }
    }

    fn domain_error(err: &anyhow::Error) -> &DomainError {
        err.downcast_ref::<DomainError>().unwrap()
    }

    #[tokio::test]
    async fn test_insert_todo_starts_pending_with_equal_timestamps() {
        let repo = InMemoryTodoRepository::new();

        let todo = repo.insert_todo("user_1", create("Write docs")).await.unwrap();

        assert_eq!(todo.id, "todo_1");
        assert_eq!(todo.status, TodoStatus::Pending);
        assert_eq!(todo.created_at, todo.updated_at);
        assert_eq!(todo.user_id, "user_1");
    }

    #[tokio::test]
    async fn test_list_todos_newest_first() {
        let repo = InMemoryTodoRepository::new();
        for title in ["T1", "T2", "T3"] {
            repo.insert_todo("user_1", create(title)).await.unwrap();
        }

        let titles: Vec<String> = repo
            .list_todos("user_1", None)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["T3", "T2", "T1"]);
    }

    #[tokio::test]
    async fn test_list_todos_filters_by_owner_and_status() {
        let repo = InMemoryTodoRepository::new();
        let t1 = repo.insert_todo("user_1", create("T1")).await.unwrap();
        let t2 = repo.insert_todo("user_1", create("T2")).await.unwrap();
        repo.insert_todo("user_2", create("Other")).await.unwrap();

        let patch = TodoPatch {
            status: Some(TodoStatus::Completed),
            ..Default::default()
        };
        repo.update_todo(&t2.id, "user_1", patch).await.unwrap();

        let completed = repo
            .list_todos("user_1", Some(TodoStatus::Completed))
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, t2.id);

        let pending = repo
            .list_todos("user_1", Some(TodoStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, t1.id);

        let all = repo.list_todos("user_1", None).await.unwrap();
        assert!(all.iter().all(|t| t.user_id == "user_1"));
    }

    #[tokio::test]
    async fn test_update_todo_missing_is_not_found() {
        let repo = InMemoryTodoRepository::new();

        let err = repo
            .update_todo("todo_9", "user_1", TodoPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(domain_error(&err), DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_todo_other_owner_is_forbidden_and_unchanged() {
        let repo = InMemoryTodoRepository::new();
        let todo = repo.insert_todo("user_1", create("Mine")).await.unwrap();

        let patch = TodoPatch {
            title: Some("Stolen".to_string()),
            ..Default::default()
        };
        let err = repo.update_todo(&todo.id, "user_2", patch).await.unwrap_err();
        assert!(matches!(domain_error(&err), DomainError::Forbidden(_)));

        let stored = repo.find_todo(&todo.id).await.unwrap().unwrap();
        assert_eq!(stored, todo);
    }

    #[tokio::test]
    async fn test_delete_todo_checks_owner() {
        let repo = InMemoryTodoRepository::new();
        let todo = repo.insert_todo("user_1", create("Mine")).await.unwrap();

        let err = repo.delete_todo(&todo.id, "user_2").await.unwrap_err();
        assert!(matches!(domain_error(&err), DomainError::Forbidden(_)));
        assert!(repo.find_todo(&todo.id).await.unwrap().is_some());

        repo.delete_todo(&todo.id, "user_1").await.unwrap();
        assert!(repo.find_todo(&todo.id).await.unwrap().is_none());

        let err = repo.delete_todo(&todo.id, "user_1").await.unwrap_err();
        assert!(matches!(domain_error(&err), DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let repo = InMemoryTodoRepository::new();
        let first = repo.insert_todo("user_1", create("First")).await.unwrap();
        repo.delete_todo(&first.id, "user_1").await.unwrap();

        let second = repo.insert_todo("user_1", create("Second")).await.unwrap();
        assert_eq!(second.id, "todo_2");
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let repo = InMemoryTodoRepository::new();
        let todo = repo.insert_todo("user_1", create("Shared")).await.unwrap();

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let repo_clone = repo.clone();
                let id = todo.id.clone();
                tokio::spawn(async move {
                    let patch = TodoPatch {
                        title: Some(format!("title-{}", i)),
                        ..Default::default()
                    };
                    repo_clone.update_todo(&id, "user_1", patch).await
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        let stored = repo.find_todo(&todo.id).await.unwrap().unwrap();
        assert!(stored.title.starts_with("title-"));
        assert_eq!(repo.list_todos("user_1", None).await.unwrap().len(), 1);
    }
}
