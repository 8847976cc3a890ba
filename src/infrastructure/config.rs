use anyhow::{Context, Result, bail};
use std::env;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_SECRET_KEY: &str = "secret-key-change-in-production";
/// One year.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 525_600;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub secret_key: String,
    pub token_ttl_minutes: i64,
    pub log_level: String,
}

impl AppConfig {
    /// Reads configuration from the environment (and `.env`, if present).
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("PORT", 8000)?,
            secret_key: env::var("SECRET_KEY").unwrap_or_else(|_| DEFAULT_SECRET_KEY.to_string()),
            token_ttl_minutes: check_token_ttl(parse_var("TOKEN_TTL_MINUTES", 30)?)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Logs a warning if tokens would be signed with the built-in secret.
    pub fn warn_if_insecure(&self) {
        if self.secret_key == DEFAULT_SECRET_KEY {
            warn!("SECRET_KEY is not set, signing tokens with the insecure default");
        }
    }
}

fn check_token_ttl(minutes: i64) -> Result<i64> {
    if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&minutes) {
        bail!(
            "TOKEN_TTL_MINUTES must be between 1 and {}, got {}",
            MAX_TOKEN_TTL_MINUTES,
            minutes
        );
    }
    Ok(minutes)
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{} must be a valid number, got {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_uses_default_when_unset() {
        let value: u16 = parse_var("TODO_API_TEST_UNSET_VAR", 8000).unwrap();
        assert_eq!(value, 8000);
    }

    #[test]
    fn test_token_ttl_must_be_positive_and_bounded() {
        assert_eq!(check_token_ttl(30).unwrap(), 30);
        assert_eq!(check_token_ttl(1).unwrap(), 1);
        assert_eq!(check_token_ttl(MAX_TOKEN_TTL_MINUTES).unwrap(), MAX_TOKEN_TTL_MINUTES);

        for minutes in [0, -5, MAX_TOKEN_TTL_MINUTES + 1, i64::MAX, i64::MIN] {
            let err = check_token_ttl(minutes).unwrap_err();
            assert!(err.to_string().contains("TOKEN_TTL_MINUTES"), "accepted {}", minutes);
        }
    }

    #[test]
    fn test_parse_var_reports_bad_number() {
        // SAFETY: the variable name is unique to this test
        unsafe { env::set_var("TODO_API_TEST_BAD_PORT", "eighty") };
        let err = parse_var::<u16>("TODO_API_TEST_BAD_PORT", 8000).unwrap_err();
        assert!(err.to_string().contains("TODO_API_TEST_BAD_PORT"));
    }
}
