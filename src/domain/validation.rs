use crate::domain::error::DomainError;

/// Checks that `value` is between `min` and `max` characters long (inclusive).
pub fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), DomainError> {
    let len = value.chars().count();
    if len < min {
        return Err(DomainError::Validation(format!(
            "{} must be at least {} characters",
            field, min
        )));
    }
    if len > max {
        return Err(DomainError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

/// Shape check only: one `@`, a non-empty local part, a dotted domain without
/// empty labels, and no whitespace.
pub fn check_email(email: &str) -> Result<(), DomainError> {
    let invalid = || DomainError::Validation("email is not a valid email address".to_string());

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(invalid());
    }
    if domain.split('.').any(str::is_empty) {
        return Err(invalid());
    }
    Ok(())
}
