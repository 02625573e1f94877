//! Password strength validation for account registration.

use serde::Serialize;
use thiserror::Error;

/// A single failed strength requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordIssue {
    #[error("password must be at least 8 characters")]
    TooShort,
    #[error("password must contain at least one uppercase letter")]
    MissingUppercase,
    #[error("password must contain at least one lowercase letter")]
    MissingLowercase,
    #[error("password must contain at least one digit")]
    MissingDigit,
    #[error("password must contain at least one special character")]
    MissingSpecial,
}

/// Outcome of a strength check.
#[derive(Debug, Clone, Serialize)]
pub struct PasswordStrength {
    pub is_valid: bool,
    pub issues: Vec<PasswordIssue>,
}

const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Check a candidate password against all strength requirements.
/// Every failed requirement is reported, not just the first.
pub fn validate_password_strength(password: &str) -> PasswordStrength {
    let mut issues = Vec::new();

    if password.chars().count() < 8 {
        issues.push(PasswordIssue::TooShort);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        issues.push(PasswordIssue::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        issues.push(PasswordIssue::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        issues.push(PasswordIssue::MissingDigit);
    }
    if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        issues.push(PasswordIssue::MissingSpecial);
    }

    PasswordStrength {
        is_valid: issues.is_empty(),
        issues,
    }
}
