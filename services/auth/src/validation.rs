//! Input validation utilities

use common::{ServiceError, ServiceResult};
use regex::Regex;
use std::sync::OnceLock;

/// Symbols that satisfy the special-character rule of the password policy
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*()-_=+[]{};:'\",.<>/?\\|`~";

pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const PASSWORD_MAX_LENGTH: usize = 128;

/// Validate username
pub fn validate_username(username: &str) -> ServiceResult<()> {
    if username.is_empty() {
        return Err(ServiceError::validation("Username is required"));
    }

    if username.len() < 3 {
        return Err(ServiceError::validation(
            "Username must be at least 3 characters long",
        ));
    }

    if username.len() > 32 {
        return Err(ServiceError::validation(
            "Username must be at most 32 characters long",
        ));
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err(ServiceError::validation(
            "Username can only contain letters, numbers, and underscores",
        ));
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> ServiceResult<()> {
    if password.is_empty() {
        return Err(ServiceError::validation("Password is required"));
    }

    let length = password.chars().count();

    if length < PASSWORD_MIN_LENGTH {
        return Err(ServiceError::validation(
            "Password must be at least 8 characters long",
        ));
    }

    if length > PASSWORD_MAX_LENGTH {
        return Err(ServiceError::validation(
            "Password must be at most 128 characters long",
        ));
    }

    let mut has_upper = false;
    let mut has_lower = false;
    let mut has_digit = false;
    let mut has_special = false;

    for c in password.chars() {
        if c.is_ascii_uppercase() {
            has_upper = true;
        } else if c.is_ascii_lowercase() {
            has_lower = true;
        } else if c.is_ascii_digit() {
            has_digit = true;
        } else if PASSWORD_SYMBOLS.contains(c) {
            has_special = true;
        }
    }

    if !has_upper {
        return Err(ServiceError::validation(
            "Password must contain at least one uppercase letter",
        ));
    }

    if !has_lower {
        return Err(ServiceError::validation(
            "Password must contain at least one lowercase letter",
        ));
    }

    if !has_digit {
        return Err(ServiceError::validation(
            "Password must contain at least one digit",
        ));
    }

    if !has_special {
        return Err(ServiceError::validation(format!(
            "Password must contain at least one special character from {}",
            PASSWORD_SYMBOLS
        )));
    }

    Ok(())
}
