use crate::domain::user::{CreateUser, LoginRequest, User, UserResponse};
use crate::presentation::handlers::{ApiError, AppState};
use crate::presentation::middleware::AuthenticatedUser;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserResponse,
}

fn auth_response(state: &AppState, user: &User) -> Result<AuthResponse, ApiError> {
    let access_token = state.auth_service.issue_token(user)?;
    Ok(AuthResponse {
        access_token,
        token_type: "bearer".to_string(),
        user: UserResponse::from(user),
    })
}

#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn signup(
    state: web::Data<AppState>,
    req: web::Json<CreateUser>,
) -> Result<HttpResponse, ApiError> {
    info!("Signup request received");

    let user = state
        .auth_service
        .register_user(req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to register user");
            ApiError::from(e)
        })?;

    let response = auth_response(&state, &user)?;
    info!(user_id = %user.id, "User signed up");
    Ok(HttpResponse::Created().json(response))
}

#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    let user = state
        .auth_service
        .login(req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to login");
            ApiError::from(e)
        })?;

    let response = auth_response(&state, &user)?;
    Ok(HttpResponse::Ok().json(response))
}

#[instrument(skip_all, fields(user_id = %user.0.id))]
pub async fn profile(user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(UserResponse::from(&user.0))
}
