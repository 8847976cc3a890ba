use crate::domain::error::DomainError;
use crate::domain::validation::check_length;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

const TITLE_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 1000;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TodoStatus {
    Pending,
    Completed,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TodoStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateTodo {
    pub fn validate(&self) -> Result<(), DomainError> {
        check_length("title", &self.title, 1, TITLE_MAX)?;
        if let Some(description) = &self.description {
            check_length("description", description, 0, DESCRIPTION_MAX)?;
        }
        Ok(())
    }
}

/// Partial update of a [`Todo`].
///
/// `description` keeps track of presence: `None` leaves the field untouched,
/// `Some(None)` clears it, `Some(Some(_))` replaces it. An explicit `null` for
/// `title` or `status` is treated like an absent field.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TodoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TodoStatus>,
}

// Only called when the key is present, so a JSON null becomes `Some(None)`.
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl TodoPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.status.is_none()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(title) = &self.title {
            check_length("title", title, 1, TITLE_MAX)?;
        }
        if let Some(Some(description)) = &self.description {
            check_length("description", description, 0, DESCRIPTION_MAX)?;
        }
        Ok(())
    }

    /// Applies the present fields to `todo`. Returns whether anything was applied;
    /// `updated_at` is refreshed in that case.
    pub fn apply(self, todo: &mut Todo, now: DateTime<Utc>) -> bool {
        if self.is_empty() {
            return false;
        }
        if let Some(title) = self.title {
            todo.title = title;
        }
        if let Some(description) = self.description {
            todo.description = description;
        }
        if let Some(status) = self.status {
            todo.status = status;
        }
        todo.updated_at = now;
        true
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TodoQuery {
    pub status: Option<TodoStatus>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TodoStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub completion_rate: f64,
}

impl TodoStats {
    pub fn from_todos(todos: &[Todo]) -> Self {
        let total = todos.len();
        let completed = todos
            .iter()
            .filter(|t| t.status == TodoStatus::Completed)
            .count();
        let completion_rate = if total == 0 {
            0.0
        } else {
            // One decimal, exact halves to even (6.25 -> 6.2)
            let pct = completed as f64 / total as f64 * 100.0;
            (pct * 10.0).round_ties_even() / 10.0
        };
        Self {
            total,
            completed,
            pending: total - completed,
            completion_rate,
        }
    }
}
