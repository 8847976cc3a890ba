use crate::presentation::auth::{login, profile, signup};
use crate::presentation::handlers::{health_check, json_error_handler, query_error_handler, root};
use crate::presentation::middleware::AuthGate;
use crate::presentation::todos::{
    create_todo, delete_todo, get_todo, list_todos, todo_stats, update_todo,
};
use actix_web::web;

/// Registers every route of the service. `AppState` is provided by the caller.
///
/// `/api/user` and `/api/todos` sit behind [`AuthGate`].
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .route("/", web::get().to(root))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(health_check))
                .route("/auth/signup", web::post().to(signup))
                .route("/auth/login", web::post().to(login))
                .service(
                    web::scope("/user")
                        .wrap(AuthGate)
                        .route("/profile", web::get().to(profile)),
                )
                .service(
                    web::scope("/todos")
                        .wrap(AuthGate)
                        .route("", web::post().to(create_todo))
                        .route("", web::get().to(list_todos))
                        .route("/stats/summary", web::get().to(todo_stats))
                        .route("/{id}", web::get().to(get_todo))
                        .route("/{id}", web::put().to(update_todo))
                        .route("/{id}", web::delete().to(delete_todo)),
                ),
        );
}

pub const ROUTES: &str = "GET /, GET /api/health, POST /api/auth/signup, POST /api/auth/login, \
    GET /api/user/profile, POST /api/todos, GET /api/todos, GET /api/todos/stats/summary, \
    GET /api/todos/{id}, PUT /api/todos/{id}, DELETE /api/todos/{id}";
