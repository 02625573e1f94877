//! Account service: registration, login, password changes.

use exercise_core::validate_password_strength;

use crate::db::Database;
use crate::error::{ApiError, Result};
use crate::models::User;

/// Matches the cost the original deployment used.
const BCRYPT_COST: u32 = 12;

pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    bcrypt::verify(password, password_hash)
        .map_err(|e| ApiError::Internal(format!("password verification failed: {}", e)))
}

fn check_strength(password: &str) -> Result<()> {
    let strength = validate_password_strength(password);
    if !strength.is_valid {
        let reasons: Vec<String> = strength.issues.iter().map(|i| i.to_string()).collect();
        return Err(ApiError::BadRequest(format!(
            "weak password: {}",
            reasons.join(", ")
        )));
    }
    Ok(())
}

/// Register a new account. The password must pass the strength check
/// before it is hashed and stored.
pub async fn register(db: &Database, email: &str, password: &str) -> Result<User> {
    check_strength(password)?;

    if db.get_user_by_email(email).await?.is_some() {
        return Err(ApiError::BadRequest("email already registered".to_string()));
    }

    let password_hash = hash_password(password)?;
    db.create_user(email, &password_hash).await
}

/// Verify credentials and return the account. Unknown email and wrong
/// password are indistinguishable to the caller.
pub async fn login(db: &Database, email: &str, password: &str) -> Result<User> {
    let user = db
        .get_user_by_email(email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid credentials".to_string()))?;

    if !verify_password(password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("invalid credentials".to_string()));
    }

    Ok(user)
}

/// Change a user's password after re-verifying the current one.
pub async fn change_password(
    db: &Database,
    user: &User,
    current_password: &str,
    new_password: &str,
) -> Result<()> {
    if !verify_password(current_password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("invalid credentials".to_string()));
    }

    check_strength(new_password)?;

    let password_hash = hash_password(new_password)?;
    db.update_password(user.id, &password_hash).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify_roundtrip() {
        let hash = hash_password("Tr4ining!Day").unwrap();
        assert!(verify_password("Tr4ining!Day", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_weak_password_rejected_before_hashing() {
        let err = check_strength("short").unwrap_err();
        assert!(err.to_string().contains("weak password"));
    }
}
