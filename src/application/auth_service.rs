use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::{CreateUser, LoginRequest, NewUser, User};
use crate::infrastructure::security::{TokenCodec, TokenError, hash_password, verify_password};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, trace, warn};

const INVALID_CREDENTIALS: &str = "Incorrect email or password";

/// Registration, login and bearer-token authentication.
pub struct AuthService {
    user_repository: Arc<dyn UserRepository>,
    tokens: TokenCodec,
}

impl AuthService {
    pub fn new(user_repository: Arc<dyn UserRepository>, tokens: TokenCodec) -> Self {
        Self {
            user_repository,
            tokens,
        }
    }

    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn register_user(&self, req: CreateUser) -> Result<User> {
        trace!("Starting user registration");
        req.validate()?;

        // Fail fast before paying for the hash; the repository re-checks under its lock
        if self
            .user_repository
            .find_user_by_email(&req.email)
            .await?
            .is_some()
        {
            warn!(email = %req.email, "User already exists");
            return Err(DomainError::EmailTaken.into());
        }

        let password = req.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| DomainError::Internal(format!("Password hashing task failed: {}", e)))?
            .map_err(|e| {
                error!(error = %e, "Failed to hash password");
                DomainError::Internal(format!("Failed to hash password: {}", e))
            })?;

        let user = self
            .user_repository
            .insert_user(NewUser {
                name: req.name,
                email: req.email,
                password_hash,
            })
            .await?;

        info!(
            user_id = %user.id,
            email = %user.email,
            "User registered successfully"
        );

        Ok(user)
    }

    /// Verifies credentials. Unknown email and wrong password are indistinguishable.
    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn login(&self, req: LoginRequest) -> Result<User> {
        trace!("Starting login");
        req.validate()?;

        let user = self
            .user_repository
            .find_user_by_email(&req.email)
            .await?
            .ok_or_else(|| {
                warn!(email = %req.email, "User not found during login");
                DomainError::Unauthenticated(INVALID_CREDENTIALS.to_string())
            })?;

        let password = req.password;
        let hash = user.password_hash.clone();
        let is_valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| {
                DomainError::Internal(format!("Password verification task failed: {}", e))
            })?;

        if !is_valid {
            warn!(user_id = %user.id, "Invalid password during login");
            return Err(DomainError::Unauthenticated(INVALID_CREDENTIALS.to_string()).into());
        }

        info!(user_id = %user.id, "Login successful");
        Ok(user)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub fn issue_token(&self, user: &User) -> Result<String> {
        let token = self.tokens.issue(&user.id).map_err(|e| {
            error!(error = %e, "Failed to generate token");
            DomainError::Internal(format!("Failed to generate token: {}", e))
        })?;
        debug!("Token issued");
        Ok(token)
    }

    /// Resolves the `Authorization` header value to a registered user.
    ///
    /// Every failure, including a valid token for an unknown user, is
    /// `DomainError::Unauthenticated`. Never mutates state.
    #[instrument(skip_all)]
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<User> {
        let header = authorization.ok_or_else(|| {
            debug!("Missing authorization header");
            DomainError::Unauthenticated("Missing bearer token".to_string())
        })?;

        // The scheme name is case-insensitive (RFC 7235)
        let token = header
            .trim_start()
            .split_once(' ')
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, token)| token.trim())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                debug!("Authorization header is not a bearer token");
                DomainError::Unauthenticated("Invalid authorization scheme".to_string())
            })?;

        let user_id = self.tokens.verify(token).map_err(|e| {
            match e {
                TokenError::Expired => debug!("Token expired"),
                _ => warn!(error = %e, "Token failed verification"),
            }
            DomainError::Unauthenticated(e.to_string())
        })?;

        let user = self
            .user_repository
            .find_user_by_id(&user_id)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %user_id, "Token refers to unknown user");
                DomainError::Unauthenticated("User not found".to_string())
            })?;

        trace!(user_id = %user.id, "Request authenticated");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::user_repository::InMemoryUserRepository;
    use chrono::{Duration, Utc};

    const SECRET: &str = "auth-service-test-secret";

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(InMemoryUserRepository::new()),
            TokenCodec::new(SECRET, Duration::minutes(30)),
        )
    }

    fn signup(email: &str) -> CreateUser {
        CreateUser {
            name: "Alice".to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
        }
    }

    fn is_unauthenticated(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Unauthenticated(_))
        )
    }

    #[tokio::test]
    async fn test_register_user_hashes_password() {
        let service = service();

        let user = service.register_user(signup("alice@example.com")).await.unwrap();

        assert_eq!(user.id, "user_1");
        assert_ne!(user.password_hash, "password123");
        assert!(verify_password("password123", &user.password_hash));
    }

    #[tokio::test]
    async fn test_register_user_duplicate_email_is_taken() {
        let service = service();
        service.register_user(signup("alice@example.com")).await.unwrap();

        let err = service
            .register_user(signup("alice@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn test_register_user_rejects_invalid_input() {
        let service = service();
        let mut req = signup("alice@example.com");
        req.password = "short".to_string();

        let err = service.register_user(req).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_login_with_correct_and_wrong_password() {
        let service = service();
        let registered = service.register_user(signup("alice@example.com")).await.unwrap();

        let user = service
            .login(LoginRequest {
                email: "alice@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(user.id, registered.id);

        let err = service
            .login(LoginRequest {
                email: "alice@example.com".to_string(),
                password: "wrong-password".to_string(),
            })
            .await
            .unwrap_err();
        assert!(is_unauthenticated(&err));
    }

    #[tokio::test]
    async fn test_login_unknown_email_is_unauthenticated() {
        let err = service()
            .login(LoginRequest {
                email: "ghost@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap_err();
        assert!(is_unauthenticated(&err));
    }

    #[tokio::test]
    async fn test_authenticate_resolves_issued_token() {
        let service = service();
        let user = service.register_user(signup("alice@example.com")).await.unwrap();
        let token = service.issue_token(&user).unwrap();

        let header = format!("Bearer {}", token);
        let resolved = service.authenticate(Some(&header)).await.unwrap();
        assert_eq!(resolved.id, user.id);
        assert_eq!(resolved.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_authenticate_rejects_missing_and_malformed_headers() {
        let service = service();

        for header in [None, Some("Basic abc"), Some("Bearer "), Some("Bearer garbage")] {
            let err = service.authenticate(header).await.unwrap_err();
            assert!(is_unauthenticated(&err), "accepted {:?}", header);
        }
    }

    #[tokio::test]
    async fn test_authenticate_accepts_any_case_of_bearer_scheme() {
        let service = service();
        let user = service.register_user(signup("alice@example.com")).await.unwrap();
        let token = service.issue_token(&user).unwrap();

        for scheme in ["Bearer", "bearer", "BEARER", "bEaReR"] {
            let header = format!("{} {}", scheme, token);
            let resolved = service.authenticate(Some(&header)).await.unwrap();
            assert_eq!(resolved.id, user.id, "rejected scheme {}", scheme);
        }

        let err = service
            .authenticate(Some(&format!("Bearertoken{}", token)))
            .await
            .unwrap_err();
        assert!(is_unauthenticated(&err));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_expired_token() {
        let service = service();
        let user = service.register_user(signup("alice@example.com")).await.unwrap();
        let token = TokenCodec::new(SECRET, Duration::minutes(30))
            .issue_at(&user.id, Utc::now() - Duration::hours(1))
            .unwrap();

        let header = format!("Bearer {}", token);
        let err = service.authenticate(Some(&header)).await.unwrap_err();
        assert!(is_unauthenticated(&err));
        assert!(err.to_string().contains("expired"));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user_is_unauthenticated_not_not_found() {
        let service = service();
        let token = TokenCodec::new(SECRET, Duration::minutes(30))
            .issue("user_99")
            .unwrap();

        let header = format!("Bearer {}", token);
        let err = service.authenticate(Some(&header)).await.unwrap_err();
        assert!(is_unauthenticated(&err));
    }
}
