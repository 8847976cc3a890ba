use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use anyhow::Context;
use chrono::Duration;
use std::sync::Arc;
use todo_api::application::auth_service::AuthService;
use todo_api::application::todo_service::TodoService;
use todo_api::data::todo_repository::InMemoryTodoRepository;
use todo_api::data::user_repository::InMemoryUserRepository;
use todo_api::infrastructure::config::AppConfig;
use todo_api::infrastructure::logging::init_logging;
use todo_api::infrastructure::security::TokenCodec;
use todo_api::presentation::handlers::AppState;
use todo_api::presentation::middleware::{RequestIdMiddleware, TimingMiddleware};
use todo_api::presentation::routes::{ROUTES, configure};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_logging(&config.log_level);
    info!("Logging initialized successfully");
    config.warn_if_insecure();

    let ttl = Duration::try_minutes(config.token_ttl_minutes)
        .context("TOKEN_TTL_MINUTES is out of range")?;
    let tokens = TokenCodec::new(&config.secret_key, ttl);
    let auth_service = AuthService::new(Arc::new(InMemoryUserRepository::new()), tokens);
    let todo_service = TodoService::new(Arc::new(InMemoryTodoRepository::new()));

    let state = web::Data::new(AppState {
        auth_service: Arc::new(auth_service),
        todo_service,
    });
    info!("Application state initialized");

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .wrap(Cors::permissive())
            .configure(configure)
    });

    let bind_addr = format!("{}:{}", config.host, config.port);
    let server = server.bind((config.host.as_str(), config.port))?;
    info!(address = %bind_addr, routes = %ROUTES, "Starting HTTP server");
    server.run().await?;
    Ok(())
}
