//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Longest accepted message body, in characters, after trimming
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Normalize an email for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Return the value untouched, or `message` when it is absent or blank
pub fn require_field<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str, String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(message.to_string()),
    }
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.chars().count() < 6 {
        return Err("Password must be at least 6 characters long".to_string());
    }

    Ok(())
}

/// Validate a message body and return it trimmed
pub fn validate_message_body(body: &str) -> Result<String, String> {
    let body = body.trim();

    if body.is_empty() {
        return Err("Message is required".to_string());
    }

    if body.chars().count() > MAX_MESSAGE_CHARS {
        return Err(format!(
            "Message too long (max {MAX_MESSAGE_CHARS} characters)"
        ));
    }

    Ok(body.to_string())
}
