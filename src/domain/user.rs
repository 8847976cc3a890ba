use crate::domain::error::DomainError;
use crate::domain::validation::{check_email, check_length};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A user ready to be stored; the repository assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl CreateUser {
    pub fn validate(&self) -> Result<(), DomainError> {
        check_length("name", &self.name, 2, 50)?;
        check_email(&self.email)?;
        check_length("password", &self.password, 6, usize::MAX)?;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        check_email(&self.email)
    }
}

/// Outward view of a [`User`]; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(name: &str, email: &str, password: &str) -> CreateUser {
        CreateUser {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_create_user_validate_accepts_valid_input() {
        assert!(signup("Al", "al@example.com", "secret").validate().is_ok());
    }

    #[test]
    fn test_create_user_validate_rejects_short_name() {
        let err = signup("A", "a@example.com", "secret").validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref msg) if msg.contains("name")));
    }

    #[test]
    fn test_create_user_validate_rejects_long_name() {
        let name = "x".repeat(51);
        assert!(signup(&name, "a@example.com", "secret").validate().is_err());
    }

    #[test]
    fn test_create_user_validate_rejects_short_password() {
        let err = signup("Alice", "a@example.com", "12345").validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref msg) if msg.contains("password")));
    }

    #[test]
    fn test_create_user_validate_rejects_bad_email() {
        assert!(signup("Alice", "not-an-email", "secret").validate().is_err());
    }

    #[test]
    fn test_user_response_hides_password_hash() {
        let user = User {
            id: "user_1".to_string(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$hash".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(UserResponse::from(&user)).unwrap();
        assert_eq!(json["id"], "user_1");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password").is_none());
    }
}
