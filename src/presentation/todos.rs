use crate::domain::todo::{CreateTodo, TodoPatch, TodoQuery};
use crate::presentation::handlers::{ApiError, AppState};
use crate::presentation::middleware::AuthenticatedUser;
use actix_web::{HttpResponse, web};
use tracing::{error, info, instrument};

#[instrument(skip_all, fields(user_id = %user.0.id, todo_id))]
pub async fn create_todo(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    req: web::Json<CreateTodo>,
) -> Result<HttpResponse, ApiError> {
    let todo = state
        .todo_service
        .create_todo(&user.0.id, req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create todo");
            ApiError::from(e)
        })?;
    tracing::Span::current().record("todo_id", todo.id.as_str());
    info!("Todo created successfully");
    Ok(HttpResponse::Created().json(todo))
}

#[instrument(skip_all, fields(user_id = %user.0.id, status = ?query.status))]
pub async fn list_todos(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    query: web::Query<TodoQuery>,
) -> Result<HttpResponse, ApiError> {
    let todos = state
        .todo_service
        .list_todos(&user.0.id, query.status)
        .await?;
    info!(count = todos.len(), "Todos listed");
    Ok(HttpResponse::Ok().json(todos))
}

#[instrument(skip_all, fields(user_id = %user.0.id, todo_id = %*path))]
pub async fn get_todo(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let todo = state
        .todo_service
        .get_todo(&path.into_inner(), &user.0.id)
        .await?;
    Ok(HttpResponse::Ok().json(todo))
}

#[instrument(skip_all, fields(user_id = %user.0.id, todo_id = %*path))]
pub async fn update_todo(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<TodoPatch>,
) -> Result<HttpResponse, ApiError> {
    let todo = state
        .todo_service
        .update_todo(&path.into_inner(), &user.0.id, req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to update todo");
            ApiError::from(e)
        })?;
    info!("Todo updated successfully");
    Ok(HttpResponse::Ok().json(todo))
}

#[instrument(skip_all, fields(user_id = %user.0.id, todo_id = %*path))]
pub async fn delete_todo(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    state
        .todo_service
        .delete_todo(&path.into_inner(), &user.0.id)
        .await?;
    info!("Todo deleted successfully");
    Ok(HttpResponse::NoContent().finish())
}

#[instrument(skip_all, fields(user_id = %user.0.id))]
pub async fn todo_stats(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let stats = state.todo_service.stats(&user.0.id).await?;
    Ok(HttpResponse::Ok().json(stats))
}
